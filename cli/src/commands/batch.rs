use std::path::PathBuf;
use std::sync::Arc;

use clicktest_core::api::{AppConfig, CliError, DbClient, ExecutionEngine, ProgressMonitor, RunResult, Task};
use clicktest_plugins::report::{write_reports, ReportMeta};
use tokio_util::sync::CancellationToken;

/// Runs every task once, writes the reports and prints the summary.
///
/// Task failures are report content, so the exit code is 0 whenever the
/// run itself completes.
pub async fn run_batch(
    cfg: &AppConfig,
    tasks: Vec<Task>,
    client: Arc<dyn DbClient>,
    show_progress: bool,
) -> Result<i32, CliError> {
    let workers = cfg.execution.workers.max(1);
    let monitor = Arc::new(ProgressMonitor::new(tasks.len(), show_progress));
    let engine = ExecutionEngine::builder()
        .workers(workers)
        .task_timeout(cfg.query_timeout())
        .observer(monitor.clone())
        .build();

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; cancelling remaining tasks");
                cancel.cancel();
            }
        })
    };

    let run = engine.run(&tasks, client, &cancel).await;
    interrupt.abort();
    monitor.finish(run.passed, run.failed);

    let meta = ReportMeta::from_config(cfg, workers);
    let written = write_reports(&run, &meta, &cfg.report).map_err(|e| CliError::Report(format!("{e:#}")))?;

    println!("{}", summary_line(&run, &written));
    for line in failure_lines(&run) {
        eprintln!("{line}");
    }
    Ok(0)
}

pub fn summary_line(run: &RunResult, written: &[PathBuf]) -> String {
    let report = written
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "clicktest: tasks={}, passed={}, failed={}, report={}",
        run.total, run.passed, run.failed, report
    )
}

pub fn failure_lines(run: &RunResult) -> Vec<String> {
    run.failures()
        .map(|r| {
            format!(
                "  FAIL {} ({}): {}",
                r.name,
                r.kind,
                r.error.as_deref().unwrap_or_default()
            )
        })
        .collect()
}
