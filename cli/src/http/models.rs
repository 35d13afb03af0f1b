use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clicktest_core::api::{Task, TaskKind};
use serde::{Deserialize, Serialize};

// ============= Tasks =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: u32,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub query: String,
}

impl From<&Task> for TaskItem {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            description: t.description.clone(),
            kind: t.kind,
            query: t.sql.clone(),
        }
    }
}

// ============= Run =============

/// Body of `POST /api/run`. No ids means every task.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default, alias = "taskIDs")]
    pub task_ids: Vec<u32>,
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub runs_completed: u64,
    pub tasks: usize,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    ShuttingDown,
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SHUTTING_DOWN",
                "Server is shutting down".to_string(),
            ),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}
