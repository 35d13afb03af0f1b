use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::{CallContext, DbClient};
use crate::executor::panic_message;
use crate::outcome::Outcome;
use crate::task::TIME_OFFSET_PLACEHOLDER;

use super::offset::OffsetCounter;
use super::stats::{StressResult, Tally, MAX_ERROR_SAMPLES};

/// Appends the token to queries that lack one so every call still differs.
pub fn ensure_offset_token(base_query: &str) -> String {
    if base_query.contains(TIME_OFFSET_PLACEHOLDER) {
        base_query.to_string()
    } else {
        format!("{base_query} -- no {TIME_OFFSET_PLACEHOLDER}")
    }
}

/// Fires `base_query` from `workers` loops until `cancel` fires, swapping in
/// a fresh offset for `$time_offset_ms$` on every call.
pub async fn run_stress(
    cancel: &CancellationToken,
    base_query: &str,
    workers: usize,
    per_call_timeout: Duration,
    client: Arc<dyn DbClient>,
) -> StressResult {
    run_stress_with_counter(
        cancel,
        base_query,
        workers,
        per_call_timeout,
        client,
        OffsetCounter::new(),
    )
    .await
}

pub(crate) async fn run_stress_with_counter(
    cancel: &CancellationToken,
    base_query: &str,
    workers: usize,
    per_call_timeout: Duration,
    client: Arc<dyn DbClient>,
    counter: OffsetCounter,
) -> StressResult {
    let workers = workers.max(1);
    let query: Arc<str> = ensure_offset_token(base_query).into();
    let counter = Arc::new(counter);
    let samples = Arc::new(Mutex::new(Vec::with_capacity(MAX_ERROR_SAMPLES)));
    let root = CallContext::new(cancel.clone());

    tracing::info!(workers, timeout_ms = per_call_timeout.as_millis() as u64, "stress started");
    let started = Instant::now();

    let mut pool = JoinSet::new();
    for worker_id in 0..workers {
        let query = query.clone();
        let counter = counter.clone();
        let samples = samples.clone();
        let client = client.clone();
        let root = root.clone();
        pool.spawn(async move {
            let mut tally = Tally::default();
            loop {
                if root.is_cancelled() {
                    break;
                }
                let Some(offset) = counter.next() else {
                    tracing::warn!(worker_id, "offset counter exhausted; worker stopping");
                    break;
                };
                let sql = query.replace(TIME_OFFSET_PLACEHOLDER, &offset.to_string());
                let ctx = root.with_timeout(per_call_timeout);

                let call_started = Instant::now();
                let res = AssertUnwindSafe(ctx.run(client.query(&sql)))
                    .catch_unwind()
                    .await;
                let latency_ms = call_started.elapsed().as_secs_f64() * 1000.0;

                let res = match res {
                    Ok(res) => res,
                    Err(payload) => {
                        let msg = panic_message(payload);
                        tracing::warn!(worker_id, offset, panic = %msg, "stress call panicked");
                        tally.failed += 1;
                        record_sample(&samples, format!("call panicked: {msg}"));
                        continue;
                    }
                };

                match Outcome::classify(&res) {
                    Outcome::Success => {
                        tally.success += 1;
                        tally.latencies_ms.push(latency_ms);
                    }
                    Outcome::Cancelled => tally.cancelled += 1,
                    Outcome::Failed => {
                        tally.failed += 1;
                        if let Err(e) = &res {
                            tracing::debug!(worker_id, offset, error = %e, "stress call failed");
                            record_sample(&samples, e.to_string());
                        }
                    }
                }
            }
            tracing::trace!(worker_id, calls = tally.success + tally.failed + tally.cancelled, "stress worker done");
            tally
        });
    }

    let mut total = Tally::default();
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(tally) => total.merge(tally),
            Err(e) => tracing::error!(error = %e, "stress worker terminated abnormally"),
        }
    }
    let duration_sec = started.elapsed().as_secs_f64();

    let error_samples = samples.lock().map(|s| s.clone()).unwrap_or_default();
    let result = total.into_result(duration_sec, error_samples);
    tracing::info!(
        total = result.total,
        success = result.success,
        failed = result.failed,
        cancelled = result.cancelled,
        qps = result.qps,
        "stress finished"
    );
    result
}

fn record_sample(samples: &Mutex<Vec<String>>, message: String) {
    if let Ok(mut samples) = samples.lock() {
        if samples.len() < MAX_ERROR_SAMPLES {
            samples.push(message);
        }
    }
}
