use crate::task::{Task, TaskResult};

/// Hook for watching a run as it progresses.
///
/// Called from worker tasks, possibly concurrently. Observers never
/// influence results.
pub trait RunObserver: Send + Sync {
    fn task_started(&self, _task: &Task) {}

    fn task_finished(&self, _result: &TaskResult) {}
}
