use serde::{Deserialize, Serialize};

use super::types::{Task, TaskKind};

/// Rows and bytes of one partition, as reported by `system.parts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub partition: String,
    pub rows: u64,
    pub bytes: u64,
}

/// Outcome of executing a single [`Task`]. Field names are a stable JSON
/// contract consumed by external tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: u32,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub query: String,
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub granules: u64,
    pub read_rows: u64,
    pub read_bytes: u64,
    pub memory_usage: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_details: Vec<PartitionInfo>,
    pub duration_ms: f64,
    pub rows_returned: u64,
    pub projection_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain_text: Option<String>,
}

impl TaskResult {
    /// A not-yet-passing result carrying the task's identity.
    pub fn pending(task: &Task) -> Self {
        Self {
            task_id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            kind: task.kind,
            query: task.sql.clone(),
            ..Default::default()
        }
    }

    /// A failed result for a task that never produced one of its own.
    pub fn failed(task: &Task, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::pending(task)
        }
    }

    pub fn kind_str(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Aggregate of one engine invocation. `results` is in input task order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<TaskResult>,
}

impl RunResult {
    /// Builds the aggregate from ordered results, deriving the counters.
    pub fn from_results(results: Vec<TaskResult>) -> Self {
        let passed = results.iter().filter(|r| r.pass).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.pass)
    }
}
