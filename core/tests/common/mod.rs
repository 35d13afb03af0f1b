#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use clicktest_core::client::{DbClient, QueryOutcome, QueryStats};
use clicktest_core::error::ClientError;
use clicktest_core::task::PartitionInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Explain,
}

/// What the fake client does for one SQL text.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub delay: Duration,
    pub query_error: Option<ClientError>,
    pub explain: Option<Result<String, ClientError>>,
    pub outcome: QueryOutcome,
    pub panic: bool,
}

impl Script {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn delayed(ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(ms),
            ..Self::default()
        }
    }

    pub fn failing(err: ClientError) -> Self {
        Self {
            query_error: Some(err),
            ..Self::default()
        }
    }

    pub fn explain(mut self, res: Result<&str, ClientError>) -> Self {
        self.explain = Some(res.map(str::to_string));
        self
    }

    pub fn outcome(mut self, outcome: QueryOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// In-memory `DbClient` driven by per-SQL scripts. Unscripted SQL succeeds
/// immediately with an empty outcome.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(CallKind, String)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, sql: &str, script: Script) -> Self {
        self.scripts.insert(sql.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<(CallKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn query_count(&self, sql: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(kind, s)| *kind == CallKind::Query && s == sql)
            .count()
    }

    fn record(&self, kind: CallKind, sql: &str) -> Script {
        self.calls.lock().unwrap().push((kind, sql.to_string()));
        self.scripts.get(sql).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DbClient for ScriptedClient {
    async fn ping(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryOutcome, ClientError> {
        let script = self.record(CallKind::Query, sql);
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        if script.panic {
            panic!("scripted panic for {sql}");
        }
        match script.query_error {
            Some(err) => Err(err),
            None => Ok(script.outcome),
        }
    }

    async fn explain(&self, sql: &str) -> Result<String, ClientError> {
        let script = self.record(CallKind::Explain, sql);
        script.explain.unwrap_or_else(|| Ok(String::new()))
    }
}

/// Client for load tests: records every SQL text, sleeps `delay` per call
/// and fails every `fail_every`-th call (0 = never).
pub struct LoadClient {
    pub delay: Duration,
    pub fail_every: usize,
    pub panic_at: usize,
    seen: Mutex<Vec<String>>,
    count: AtomicUsize,
}

impl LoadClient {
    pub fn new(delay: Duration, fail_every: usize) -> Self {
        Self {
            delay,
            fail_every,
            panic_at: 0,
            seen: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
        }
    }

    /// Panics inside the `n`-th call instead of answering it.
    pub fn panicking_at(mut self, n: usize) -> Self {
        self.panic_at = n;
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DbClient for LoadClient {
    async fn ping(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryOutcome, ClientError> {
        self.seen.lock().unwrap().push(sql.to_string());
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if n == self.panic_at {
            panic!("connection state corrupted on call {n}");
        }
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(ClientError::database(241, format!("call {n} rejected")));
        }
        Ok(QueryOutcome::default())
    }

    async fn explain(&self, _sql: &str) -> Result<String, ClientError> {
        Ok(String::new())
    }
}

pub fn stats_outcome() -> QueryOutcome {
    QueryOutcome {
        rows: 12,
        read_rows: 8192,
        read_bytes: 65536,
        stats: QueryStats {
            query_id: Some("ct-abc".to_string()),
            memory_usage: Some(4096),
            partitions: vec!["202401".to_string()],
            partition_details: vec![PartitionInfo {
                partition: "202401".to_string(),
                rows: 8192,
                bytes: 65536,
            }],
        },
    }
}
