//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `clicktest_core::api` instead of reaching into internal modules.

pub use crate::client::{
    extract_granules, projection_used, CallContext, DbClient, QueryOutcome, QueryStats,
};
pub use crate::config::{
    load, parse_str, AppConfig, ClickHouseConfig, ConfigFormat, ExecutionConfig, LoggingConfig,
    QueryTemplate, ReportConfig, ReportFormat, ServerConfig, StressTestConfig, StructureCheck,
    TestParams, Thresholds,
};
pub use crate::error::{CliError, ClientError, ConfigError};
pub use crate::executor::{run, ExecutionEngine, ProgressMonitor, RunObserver};
pub use crate::outcome::Outcome;
pub use crate::stress::{percentile, run_stress, StressResult};
pub use crate::task::{
    build_tasks, stress_query_by_name, PartitionInfo, RunResult, Task, TaskKind, TaskOpts,
    TaskResult, TIME_OFFSET_PLACEHOLDER,
};
