use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local};
use clicktest_core::api::{AppConfig, DbClient, ExecutionEngine, Task};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tasks: Arc<Vec<Task>>,
    pub client: Arc<dyn DbClient>,
    pub engine: ExecutionEngine,
    pub stats: Arc<RwLock<ServerStats>>,
    pub shutdown_tx: broadcast::Sender<()>,
    /// Fired on shutdown so in-flight runs stop promptly.
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        tasks: Vec<Task>,
        client: Arc<dyn DbClient>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let engine = ExecutionEngine::builder()
            .workers(config.execution.workers)
            .task_timeout(config.query_timeout())
            .build();
        Self {
            config: Arc::new(config),
            tasks: Arc::new(tasks),
            client,
            engine,
            stats: Arc::new(RwLock::new(ServerStats::new())),
            shutdown_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_request(endpoint);
        }
    }
}

pub struct ServerStats {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub runs_total: u64,
    pub start_time: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests_total: 0,
            requests_by_endpoint: HashMap::new(),
            runs_total: 0,
            start_time: Local::now(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        let now = Local::now();
        (now - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
