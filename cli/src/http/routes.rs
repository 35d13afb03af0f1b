use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use clicktest_core::api::{RunResult, Task};

use crate::http::{models::*, state::AppState};

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/tasks", get(tasks_handler))
        .route("/api/run", post(run_handler))
        .route("/health", get(health_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(state)
}

/// GET / - embedded single-page UI
async fn index_handler(State(state): State<AppState>) -> Html<&'static str> {
    state.record_request("/");
    Html(INDEX_HTML)
}

/// GET /api/tasks - every task known to this server
async fn tasks_handler(State(state): State<AppState>) -> Json<Vec<TaskItem>> {
    state.record_request("/api/tasks");
    Json(state.tasks.iter().map(TaskItem::from).collect())
}

/// POST /api/run - run the selected tasks (all when none are selected)
async fn run_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RunResult>, HttpServerError> {
    state.record_request("/api/run");

    if state.cancel.is_cancelled() {
        return Err(HttpServerError::ShuttingDown);
    }

    let req = if body.iter().all(u8::is_ascii_whitespace) {
        RunRequest::default()
    } else {
        serde_json::from_slice::<RunRequest>(&body)
            .map_err(|e| HttpServerError::InvalidRequest(format!("invalid json: {e}")))?
    };

    let selected = select_tasks(&state.tasks, &req.task_ids);
    if selected.is_empty() {
        return Ok(Json(RunResult::default()));
    }

    tracing::info!(tasks = selected.len(), "run requested");
    let run = state
        .engine
        .run(&selected, state.client.clone(), &state.cancel)
        .await;

    if let Ok(mut stats) = state.stats.write() {
        stats.runs_total += 1;
    }
    Ok(Json(run))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime_seconds, requests_handled, runs_completed) = state
        .stats
        .read()
        .map(|s| (s.uptime_seconds(), s.requests_total, s.runs_total))
        .unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".into(),
        uptime_seconds,
        requests_handled,
        runs_completed,
        tasks: state.tasks.len(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// POST /api/shutdown - stop in-flight runs and shut the server down
async fn shutdown_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.cancel.cancel();
    let _ = state.shutdown_tx.send(());

    Json(serde_json::json!({
        "success": true,
        "message": "Shutdown signal sent"
    }))
}

/// Keeps input order; unknown ids are ignored.
fn select_tasks(tasks: &[Task], ids: &[u32]) -> Vec<Task> {
    if ids.is_empty() {
        return tasks.to_vec();
    }
    let wanted: HashSet<u32> = ids.iter().copied().collect();
    tasks.iter().filter(|t| wanted.contains(&t.id)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use clicktest_core::api::{
        parse_str, AppConfig, ClientError, ConfigFormat, DbClient, QueryOutcome, TaskOpts,
    };
    use serde_json::Value;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    struct FakeClient;

    #[async_trait]
    impl DbClient for FakeClient {
        async fn ping(&self) -> Result<(), ClientError> {
            Ok(())
        }

        async fn query(&self, sql: &str) -> Result<QueryOutcome, ClientError> {
            if sql.contains("broken") {
                return Err(ClientError::database(62, "Syntax error"));
            }
            Ok(QueryOutcome {
                rows: 1,
                read_rows: 100,
                ..Default::default()
            })
        }

        async fn explain(&self, _sql: &str) -> Result<String, ClientError> {
            Ok("Granules: 1/10".to_string())
        }
    }

    fn config() -> AppConfig {
        parse_str(
            r#"
[clickhouse]
host = "localhost"
database = "logs"
table_name = "events"
"#,
            ConfigFormat::Toml,
        )
        .unwrap()
    }

    fn state() -> AppState {
        let tasks = vec![
            Task::structure(1, "partitions", "SELECT partitions"),
            Task::query(2, "by_level", "SELECT by_level", TaskOpts::default()),
            Task::query(3, "broken", "SELECT broken", TaskOpts::default()),
        ];
        let (tx, _) = broadcast::channel(1);
        AppState::new(config(), tasks, Arc::new(FakeClient), tx)
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_run(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/run")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_lists_tasks() {
        let app = create_router(state());
        let resp = app
            .oneshot(Request::builder().uri("/api/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        let items = v.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["type"], "structure");
        assert_eq!(items[1]["name"], "by_level");
        assert_eq!(items[2]["query"], "SELECT broken");
    }

    #[tokio::test]
    async fn test_runs_selected_subset_in_order() {
        let app = create_router(state());
        let resp = app.oneshot(post_run(r#"{"task_ids":[3,1]}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["total"], 2);
        assert_eq!(v["passed"], 1);
        assert_eq!(v["failed"], 1);
        assert_eq!(v["results"][0]["task_id"], 1);
        assert_eq!(v["results"][1]["task_id"], 3);
        assert_eq!(v["results"][1]["error"], "code: 62, message: Syntax error");
    }

    #[tokio::test]
    async fn test_empty_body_runs_everything() {
        let app = create_router(state());
        let resp = app.oneshot(post_run("")).await.unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["total"], 3);
    }

    #[tokio::test]
    async fn test_legacy_field_and_unknown_ids() {
        let app = create_router(state());
        let resp = app.clone().oneshot(post_run(r#"{"taskIDs":[2]}"#)).await.unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["total"], 1);
        assert_eq!(v["results"][0]["read_rows"], 100);

        let resp = app.oneshot(post_run(r#"{"task_ids":[99]}"#)).await.unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["total"], 0);
        assert_eq!(v["results"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let app = create_router(state());
        let resp = app.oneshot(post_run("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error_code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let app = create_router(state());
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/api/tasks"));

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["status"], "healthy");
        assert_eq!(v["tasks"], 3);
    }

    #[tokio::test]
    async fn test_shutdown_stops_runs() {
        let st = state();
        let mut rx = st.shutdown_tx.subscribe();
        let app = create_router(st);

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/shutdown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(rx.try_recv().is_ok());

        let resp = app.oneshot(post_run("{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
