use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Deadline plus cancellation signal carried into every database call.
///
/// A child context created with [`CallContext::with_timeout`] never extends
/// its parent's deadline and shares its cancellation token, so a per-task or
/// per-call timeout composes with the run-wide stop signal.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Derives a context whose deadline is `timeout` from now. A zero
    /// timeout means no additional deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            return self.clone();
        }
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drives `fut` until it completes, the deadline passes
    /// (`DeadlineExceeded`) or the token fires (`Cancelled`).
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut).await?,
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            res = bounded => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn slow(ms: u64) -> Result<u32, ClientError> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(7)
    }

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let ctx = CallContext::new(CancellationToken::new()).with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(slow(5)).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx =
            CallContext::new(CancellationToken::new()).with_timeout(Duration::from_millis(20));
        let err = ctx.run(slow(500)).await.unwrap_err();
        assert!(matches!(err, ClientError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancelled_while_in_flight() {
        let token = CancellationToken::new();
        let ctx = CallContext::new(token.clone());
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = ctx.run(slow(5_000)).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        stopper.await.unwrap();
    }

    #[tokio::test]
    async fn test_already_cancelled_never_polls() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::new(token);
        let fut = async {
            panic!("must not be polled");
            #[allow(unreachable_code)]
            Ok::<(), ClientError>(())
        };
        let err = ctx.run(fut).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[tokio::test]
    async fn test_child_never_extends_parent_deadline() {
        let parent =
            CallContext::new(CancellationToken::new()).with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
        let unchanged = parent.with_timeout(Duration::ZERO);
        assert_eq!(unchanged.deadline(), parent.deadline());
    }
}
