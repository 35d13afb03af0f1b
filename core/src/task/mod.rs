//! Task descriptors, per-task results and the config-to-task builder.

mod builder;
mod result;
mod template;
mod types;

pub use builder::{build_tasks, stress_query_by_name};
pub use result::{PartitionInfo, RunResult, TaskResult};
pub use template::{
    substitute_query_params, substitute_query_params_for_stress, TIME_OFFSET_PLACEHOLDER,
};
pub use types::{Task, TaskKind, TaskOpts};
