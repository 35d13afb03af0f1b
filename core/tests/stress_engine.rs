mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clicktest_core::stress::run_stress;
use common::LoadClient;
use tokio_util::sync::CancellationToken;

fn cancel_after(ms: u64) -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        trigger.cancel();
    });
    cancel
}

fn offset_of(sql: &str, prefix: &str) -> u64 {
    sql.strip_prefix(prefix)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| panic!("no offset in {sql:?}"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn offsets_are_unique_and_contiguous_under_load() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(1), 0));
    let cancel = cancel_after(120);

    let res = run_stress(
        &cancel,
        "SELECT count() FROM t WHERE ts > now() - $time_offset_ms$",
        8,
        Duration::ZERO,
        client.clone(),
    )
    .await;

    let seen = client.seen();
    assert!(res.total > 0);
    assert_eq!(res.total, res.success + res.failed + res.cancelled);
    // A call that loses the race with the stop signal is counted but never reaches the client.
    assert!(seen.len() as u64 <= res.total);

    let offsets: HashSet<u64> = seen
        .iter()
        .map(|sql| offset_of(sql, "SELECT count() FROM t WHERE ts > now() - "))
        .collect();
    assert_eq!(offsets.len(), seen.len(), "an offset was reused");
    assert!(offsets.contains(&1));
    assert!(offsets.iter().all(|o| (1..=res.total).contains(o)));
}

#[tokio::test]
async fn missing_token_is_appended_as_comment() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(2), 0));
    let cancel = cancel_after(30);

    let res = run_stress(&cancel, "SELECT 1", 1, Duration::ZERO, client.clone()).await;

    assert!(res.total > 0);
    let seen = client.seen();
    assert_eq!(seen[0], "SELECT 1 -- no 1");
    let distinct: HashSet<&String> = seen.iter().collect();
    assert_eq!(distinct.len(), seen.len());
}

#[tokio::test]
async fn in_flight_calls_at_stop_are_cancelled_not_failed() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(500), 0));
    let cancel = cancel_after(30);

    let res = run_stress(&cancel, "SELECT $time_offset_ms$", 3, Duration::ZERO, client).await;

    assert_eq!(res.total, 3);
    assert_eq!(res.cancelled, 3);
    assert_eq!(res.success, 0);
    assert_eq!(res.failed, 0);
    assert_eq!(res.latency_p50_ms, 0.0);
    assert_eq!(res.latency_p99_ms, 0.0);
    assert!(res.error_samples.is_empty());
}

#[tokio::test]
async fn per_call_timeout_counts_as_cancelled() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(200), 0));
    let cancel = cancel_after(120);

    let res = run_stress(
        &cancel,
        "SELECT $time_offset_ms$",
        1,
        Duration::from_millis(20),
        client,
    )
    .await;

    assert!(res.cancelled >= 2, "got {res:?}");
    assert_eq!(res.success, 0);
    assert_eq!(res.failed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failures_are_counted_and_sampled() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(1), 2));
    let cancel = cancel_after(100);

    let res = run_stress(&cancel, "SELECT $time_offset_ms$", 2, Duration::ZERO, client).await;

    assert!(res.failed > 0);
    assert!(res.success > 0);
    assert!(res.error_samples.len() <= 5);
    assert!(!res.error_samples.is_empty());
    assert!(res.error_samples[0].starts_with("code: 241"));
    assert!(res.latency_p50_ms > 0.0);
    assert!(res.latency_p50_ms <= res.latency_p95_ms);
    assert!(res.latency_p95_ms <= res.latency_p99_ms);
    assert!(res.qps > 0.0);
}

#[tokio::test]
async fn already_cancelled_issues_nothing() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(1), 0));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let res = run_stress(&cancel, "SELECT $time_offset_ms$", 4, Duration::ZERO, client.clone()).await;

    assert_eq!(res.total, 0);
    assert_eq!(res.qps, 0.0);
    assert!(client.seen().is_empty());
}

#[tokio::test]
async fn panicking_call_is_counted_and_worker_keeps_going() {
    let client = Arc::new(LoadClient::new(Duration::from_millis(1), 0).panicking_at(20));
    let cancel = cancel_after(150);

    let res = run_stress(&cancel, "SELECT $time_offset_ms$", 1, Duration::ZERO, client.clone()).await;

    assert!(client.seen().len() > 20, "worker stopped after the panic");
    assert!(res.total > 20, "got {res:?}");
    assert!(res.success >= 19);
    assert_eq!(res.failed, 1);
    assert_eq!(res.total, res.success + res.failed + res.cancelled);
    assert_eq!(res.error_samples.len(), 1);
    assert!(res.error_samples[0].starts_with("call panicked: "));
    assert!(res.error_samples[0].contains("call 20"));
}
