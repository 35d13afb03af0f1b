//! Sustained load against a single query until a stop signal.

mod engine;
mod offset;
mod stats;

pub use engine::{ensure_offset_token, run_stress};
pub use offset::OffsetCounter;
pub use stats::{percentile, StressResult, MAX_ERROR_SAMPLES};
