use std::error::Error as StdError;

use thiserror::Error;

/// Errors surfaced by a [`crate::client::DbClient`] call.
///
/// `Cancelled` and `DeadlineExceeded` are the two signals the engines treat as
/// cancellation rather than a database failure; see
/// [`ClientError::is_cancellation`].
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("code: {code}, message: {message}")]
    Database { code: i32, message: String },

    #[error("transport: {0}")]
    Transport(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("tls: {0}")]
    Tls(String),

    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    pub fn database(code: i32, message: impl Into<String>) -> Self {
        Self::Database {
            code,
            message: message.into(),
        }
    }

    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True when this error is, or wraps, a cancellation or deadline signal.
    pub fn is_cancellation(&self) -> bool {
        is_cancellation(self)
    }
}

impl From<tokio::time::error::Elapsed> for ClientError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::DeadlineExceeded
    }
}

/// Walks the `source()` chain looking for a cancellation signal.
pub fn is_cancellation(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(client) = e.downcast_ref::<ClientError>() {
            if matches!(client, ClientError::Cancelled | ClientError::DeadlineExceeded) {
                return true;
            }
        }
        if e.is::<tokio::time::error::Elapsed>() {
            return true;
        }
        current = e.source();
    }
    false
}
