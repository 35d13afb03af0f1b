use serde::{Deserialize, Serialize};

/// Kind of work a task performs. The set is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Validates schema metadata (partitions, indexes, projections, settings).
    #[serde(rename = "structure")]
    StructureCheck,
    /// Measures a parametrized query.
    #[default]
    Query,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StructureCheck => "structure",
            Self::Query => "query",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOpts {
    /// Run `EXPLAIN indexes = 1` before the query and parse granules from it.
    pub collect_explain: bool,
    /// Keep memory usage, query id and partition metadata from the client.
    pub collect_stats: bool,
}

/// One unit of work. Built once from config and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub kind: TaskKind,
    pub sql: String,
    pub opts: TaskOpts,
}

impl Task {
    pub fn structure(id: u32, name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            kind: TaskKind::StructureCheck,
            sql: sql.into(),
            opts: TaskOpts::default(),
        }
    }

    pub fn query(id: u32, name: impl Into<String>, sql: impl Into<String>, opts: TaskOpts) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            kind: TaskKind::Query,
            sql: sql.into(),
            opts,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
