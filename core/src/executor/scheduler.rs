use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Shared pull-based queue of item indices. Each index is handed out once.
struct IndexQueue {
    next: AtomicUsize,
    len: usize,
}

impl IndexQueue {
    fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    fn pop(&self) -> Option<usize> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        (idx < self.len).then_some(idx)
    }
}

/// Runs `exec(i)` for every `i in 0..len` on at most `workers` concurrent
/// workers and returns the outputs in index order.
///
/// A panic inside one call is caught and surfaces as `Err(message)` in that
/// slot only; the worker keeps pulling.
pub async fn execute_indexed<R, F, Fut>(len: usize, workers: usize, exec: F) -> Vec<Result<R, String>>
where
    R: Send + 'static,
    F: Fn(usize) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    if len == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, len);

    let queue = Arc::new(IndexQueue::new(len));
    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Result<R, String>)>();
    let mut pool = JoinSet::new();

    for worker_id in 0..workers {
        let queue = queue.clone();
        let tx = tx.clone();
        let exec = exec.clone();
        pool.spawn(async move {
            let mut handled = 0usize;
            while let Some(idx) = queue.pop() {
                let res = AssertUnwindSafe(exec(idx))
                    .catch_unwind()
                    .await
                    .map_err(panic_message);
                handled += 1;
                if tx.send((idx, res)).is_err() {
                    break;
                }
            }
            tracing::trace!(worker_id, handled, "worker drained");
        });
    }
    drop(tx);

    let mut slots: Vec<Option<Result<R, String>>> = (0..len).map(|_| None).collect();
    while let Some((idx, res)) = rx.recv().await {
        slots[idx] = Some(res);
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "worker terminated abnormally");
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err("worker exited before reporting".to_string())))
        .collect()
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
