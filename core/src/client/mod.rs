//! The database capability consumed by both engines.
//!
//! Implementations live in `clicktest-plugins`; the engines only see
//! `Arc<dyn DbClient>`, shared across workers without extra locking.

mod context;
mod explain;

pub use context::CallContext;
pub use explain::{extract_granules, projection_used};

use async_trait::async_trait;

use crate::error::ClientError;
use crate::task::PartitionInfo;

/// Optional metadata a client may attach to a successful query.
/// Absent fields are not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    pub query_id: Option<String>,
    pub memory_usage: Option<u64>,
    pub partitions: Vec<String>,
    pub partition_details: Vec<PartitionInfo>,
}

/// Result of a data query: rows returned plus the server's read counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub rows: u64,
    pub read_rows: u64,
    pub read_bytes: u64,
    pub stats: QueryStats,
}

#[async_trait]
pub trait DbClient: Send + Sync {
    async fn ping(&self) -> Result<(), ClientError>;

    async fn query(&self, sql: &str) -> Result<QueryOutcome, ClientError>;

    /// Returns the planner output for `sql` as text.
    async fn explain(&self, sql: &str) -> Result<String, ClientError>;

    async fn close(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
