use thiserror::Error;

use super::{ClientError, ConfigError};

/// Errors that end the process. Everything that happens inside a run is
/// recorded in the results instead.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("clickhouse: {0}")]
    Connection(ClientError),
    #[error("report failed: {0}")]
    Report(String),
    #[error("server failed: {0}")]
    Server(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    // 0: success (individual task failures are report data, not process failures)
    // 11: config error
    // 20: connection / IO error
    // 50: internal/uncategorized
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 11,
            Self::Connection(_) => 20,
            Self::Io(_) => 20,
            Self::Command(_) => 20,
            Self::Report(_) => 20,
            Self::Server(_) => 20,
            Self::Anyhow(_) => 50,
        }
    }
}
