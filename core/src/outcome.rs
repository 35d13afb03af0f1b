use serde::Serialize;

use crate::error::ClientError;

/// How a single database call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// Any database or transport error that is not a cancellation.
    Failed,
    /// The call was cut short by a deadline or an explicit stop.
    Cancelled,
}

impl Outcome {
    pub fn classify<T>(res: &Result<T, ClientError>) -> Self {
        match res {
            Ok(_) => Self::Success,
            Err(err) => Self::from_error(err),
        }
    }

    pub fn from_error(err: &ClientError) -> Self {
        if err.is_cancellation() {
            Self::Cancelled
        } else {
            Self::Failed
        }
    }
}
