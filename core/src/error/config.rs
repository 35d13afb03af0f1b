use std::path::PathBuf;

use thiserror::Error;

/// Malformed or incomplete configuration. Raised before any engine runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("parse json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("structure check {name:?}: unknown structure check type: {check_type}")]
    UnknownStructureCheck { name: String, check_type: String },

    #[error("query template {0:?} not found")]
    TemplateNotFound(String),

    #[error("stress: config must have stress_test.query_name (and duration_minutes, workers)")]
    MissingStressQuery,
}
