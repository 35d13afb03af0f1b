//! Batch execution of independent tasks.
//!
//! ```text
//! Vec<Task>
//!   ↓
//! IndexQueue (shared cursor) ──► N workers ──► execute_task()
//!                                                │
//!            slots[idx] ◄── mpsc (idx, TaskResult)
//!   ↓
//! RunResult (input order)
//! ```
//!
//! Tasks have no dependencies on each other. Every task produces exactly
//! one result, including when it times out, is cancelled or panics.

mod engine;
mod observer;
mod progress;
mod scheduler;

pub use engine::{run, ExecutionEngine, ExecutionEngineBuilder};
pub use observer::RunObserver;
pub use progress::ProgressMonitor;
pub use scheduler::execute_indexed;
pub(crate) use scheduler::panic_message;
