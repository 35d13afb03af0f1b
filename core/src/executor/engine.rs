use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::client::{extract_granules, projection_used, CallContext, DbClient};
use crate::task::{RunResult, Task, TaskKind, TaskResult};

use super::observer::RunObserver;
use super::scheduler::execute_indexed;

/// Runs a batch of tasks on a bounded worker pool.
///
/// ```ignore
/// let engine = ExecutionEngine::builder()
///     .workers(4)
///     .task_timeout(Duration::from_secs(30))
///     .build();
/// let run = engine.run(&tasks, client, &cancel).await;
/// ```
#[derive(Clone)]
pub struct ExecutionEngine {
    workers: usize,
    task_timeout: Duration,
    observer: Option<Arc<dyn RunObserver>>,
}

impl ExecutionEngine {
    pub fn builder() -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::default()
    }

    /// Executes every task exactly once and returns one result per task in
    /// input order. Never fails as a whole; errors land in the results.
    pub async fn run(
        &self,
        tasks: &[Task],
        client: Arc<dyn DbClient>,
        cancel: &CancellationToken,
    ) -> RunResult {
        if tasks.is_empty() {
            return RunResult::default();
        }

        let started = Instant::now();
        let workers = self.workers.clamp(1, tasks.len());
        tracing::info!(tasks = tasks.len(), workers, "run started");

        let shared: Arc<[Task]> = tasks.to_vec().into();
        let root = CallContext::new(cancel.clone());
        let task_timeout = self.task_timeout;
        let observer = self.observer.clone();

        let exec = {
            let shared = shared.clone();
            move |idx: usize| {
                let shared = shared.clone();
                let client = client.clone();
                let ctx = root.with_timeout(task_timeout);
                let observer = observer.clone();
                async move {
                    let task = &shared[idx];
                    if let Some(obs) = &observer {
                        obs.task_started(task);
                    }
                    let result = execute_task(task, client.as_ref(), &ctx).await;
                    if let Some(obs) = &observer {
                        obs.task_finished(&result);
                    }
                    result
                }
            }
        };

        let slots = execute_indexed(shared.len(), workers, exec).await;

        let results: Vec<TaskResult> = slots
            .into_iter()
            .zip(shared.iter())
            .map(|(slot, task)| {
                slot.unwrap_or_else(|panic| {
                    tracing::error!(task_id = task.id, task = %task.name, "task panicked: {panic}");
                    let failed = TaskResult::failed(task, format!("task panicked: {panic}"));
                    if let Some(obs) = &self.observer {
                        obs.task_finished(&failed);
                    }
                    failed
                })
            })
            .collect();

        let run = RunResult::from_results(results);
        tracing::info!(
            total = run.total,
            passed = run.passed,
            failed = run.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        run
    }
}

#[derive(Default)]
pub struct ExecutionEngineBuilder {
    workers: Option<usize>,
    task_timeout: Duration,
    observer: Option<Arc<dyn RunObserver>>,
}

impl ExecutionEngineBuilder {
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Deadline applied to each task separately. Zero disables it.
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            workers: self.workers.unwrap_or(1).max(1),
            task_timeout: self.task_timeout,
            observer: self.observer,
        }
    }
}

/// Convenience entry point for a one-off run without an observer.
pub async fn run(
    tasks: &[Task],
    workers: usize,
    client: Arc<dyn DbClient>,
    per_task_timeout: Duration,
    cancel: &CancellationToken,
) -> RunResult {
    ExecutionEngine::builder()
        .workers(workers)
        .task_timeout(per_task_timeout)
        .build()
        .run(tasks, client, cancel)
        .await
}

async fn execute_task(task: &Task, client: &dyn DbClient, ctx: &CallContext) -> TaskResult {
    let mut res = TaskResult::pending(task);

    match task.kind {
        // Pass/fail only: no timing or read counters for schema checks.
        TaskKind::StructureCheck => {
            match ctx.run(client.query(&task.sql)).await {
                Ok(_) => res.pass = true,
                Err(e) => {
                    tracing::debug!(task_id = task.id, error = %e, "structure check failed");
                    res.error = Some(e.to_string());
                }
            }
        }
        TaskKind::Query => {
            if task.opts.collect_explain {
                match ctx.run(client.explain(&task.sql)).await {
                    Ok(text) => {
                        res.granules = extract_granules(&text);
                        res.projection_used = projection_used(&text);
                        res.explain_text = Some(text);
                    }
                    Err(e) => {
                        tracing::debug!(task_id = task.id, error = %e, "explain failed");
                        res.error = Some(format!("EXPLAIN: {e}"));
                        return res;
                    }
                }
            }

            let started = Instant::now();
            let outcome = ctx.run(client.query(&task.sql)).await;
            res.duration_ms = elapsed_ms(started);

            match outcome {
                Ok(out) => {
                    res.pass = true;
                    res.rows_returned = out.rows;
                    res.read_rows = out.read_rows;
                    res.read_bytes = out.read_bytes;
                    if task.opts.collect_stats {
                        res.memory_usage = out.stats.memory_usage.unwrap_or(0);
                        res.query_id = out.stats.query_id;
                        res.partitions = out.stats.partitions;
                        res.partition_details = out.stats.partition_details;
                    }
                }
                Err(e) => {
                    tracing::debug!(task_id = task.id, error = %e, "query failed");
                    res.error = Some(e.to_string());
                }
            }
        }
    }

    tracing::debug!(
        task_id = task.id,
        task = %task.name,
        pass = res.pass,
        duration_ms = res.duration_ms,
        "task finished"
    );
    res
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
