use serde::Serialize;

/// Most failure messages kept for a stress run.
pub const MAX_ERROR_SAMPLES: usize = 5;

/// Aggregate of one stress run. `total == success + failed + cancelled`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StressResult {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub duration_sec: f64,
    pub qps: f64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_samples: Vec<String>,
}

/// Per-worker tally, merged once when the worker exits.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub success: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub latencies_ms: Vec<f64>,
}

impl Tally {
    pub fn merge(&mut self, other: Tally) {
        self.success += other.success;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.latencies_ms.extend(other.latencies_ms);
    }

    pub fn into_result(mut self, duration_sec: f64, error_samples: Vec<String>) -> StressResult {
        let total = self.success + self.failed + self.cancelled;
        self.latencies_ms.sort_by(|a, b| a.total_cmp(b));
        StressResult {
            total,
            success: self.success,
            failed: self.failed,
            cancelled: self.cancelled,
            duration_sec,
            qps: if duration_sec > 0.0 {
                total as f64 / duration_sec
            } else {
                0.0
            },
            latency_p50_ms: percentile(&self.latencies_ms, 50),
            latency_p95_ms: percentile(&self.latencies_ms, 95),
            latency_p99_ms: percentile(&self.latencies_ms, 99),
            error_samples,
        }
    }
}

/// Rank-based percentile over an ascending slice: `sorted[floor(n*p/100)]`,
/// clamped to the last element. No interpolation. Empty input gives 0.
pub fn percentile(sorted: &[f64], p: u32) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let idx = (n * p as usize / 100).min(n - 1);
    sorted[idx]
}
