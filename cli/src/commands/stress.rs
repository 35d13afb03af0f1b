use std::sync::Arc;
use std::time::Duration;

use clicktest_core::api::{
    stress_query_by_name, AppConfig, CliError, ConfigError, DbClient, ProgressMonitor, StressResult,
};
use clicktest_core::stress::run_stress;
use tokio_util::sync::CancellationToken;

use super::cli::StressArgs;

/// Everything a stress run needs, resolved from config before connecting.
#[derive(Debug, Clone, PartialEq)]
pub struct StressPlan {
    pub query_name: String,
    pub base_query: String,
    pub duration: Duration,
    pub workers: usize,
    pub per_call_timeout: Duration,
}

impl StressPlan {
    pub fn from_config(cfg: &AppConfig, args: &StressArgs) -> Result<Self, ConfigError> {
        let section = cfg.stress_test.clone().unwrap_or_default();
        let query_name = args
            .query
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(section.query_name);
        if query_name.trim().is_empty() {
            return Err(ConfigError::MissingStressQuery);
        }
        let base_query = stress_query_by_name(cfg, &query_name)?;

        let minutes = args.minutes.unwrap_or(section.duration_minutes);
        let workers = if section.workers > 0 {
            section.workers
        } else {
            cfg.execution.workers
        };

        Ok(Self {
            query_name,
            base_query,
            duration: Duration::from_secs(minutes.saturating_mul(60)),
            workers: workers.max(1),
            per_call_timeout: cfg.query_timeout(),
        })
    }
}

pub async fn run_stress_command(
    plan: StressPlan,
    client: Arc<dyn DbClient>,
    show_progress: bool,
) -> Result<i32, CliError> {
    println!(
        "clicktest stress: duration={}s, workers={}, query={}",
        plan.duration.as_secs(),
        plan.workers,
        plan.query_name
    );

    let cancel = CancellationToken::new();
    let stopper = {
        let cancel = cancel.clone();
        let duration = plan.duration;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("interrupted; stopping stress run early");
                }
            }
            cancel.cancel();
        })
    };

    let spinner = ProgressMonitor::spinner(format!("stress: {}", plan.query_name), show_progress);
    let res = run_stress(
        &cancel,
        &plan.base_query,
        plan.workers,
        plan.per_call_timeout,
        client,
    )
    .await;
    spinner.finish_and_clear();
    stopper.abort();

    println!("{}", format_result(&res));
    if !res.error_samples.is_empty() {
        eprintln!("error samples:");
        for sample in &res.error_samples {
            eprintln!("  {sample}");
        }
    }
    Ok(0)
}

pub fn format_result(res: &StressResult) -> String {
    format!(
        "stress result: total={} success={} failed={} cancelled={} duration={:.1}s QPS={:.1} \
         latency_p50={:.1}ms p95={:.1}ms p99={:.1}ms",
        res.total,
        res.success,
        res.failed,
        res.cancelled,
        res.duration_sec,
        res.qps,
        res.latency_p50_ms,
        res.latency_p95_ms,
        res.latency_p99_ms
    )
}
