use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub clickhouse: ClickHouseConfig,

    #[serde(default)]
    pub test_params: TestParams,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub stress_test: Option<StressTestConfig>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub structure_checks: Vec<StructureCheck>,

    #[serde(default)]
    pub query_templates: Vec<QueryTemplate>,
}

impl AppConfig {
    /// `database.table_name`, the value substituted for `$table_name$`.
    pub fn full_table(&self) -> String {
        format!(
            "{}.{}",
            self.clickhouse.database, self.clickhouse.table_name
        )
    }

    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.execution.query_timeout_sec)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    #[serde(default)]
    pub host: String,

    /// HTTP interface port: 8123 (plain) or 8443 (TLS).
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub table_name: String,

    #[serde(default)]
    pub secure: bool,

    /// Unset means "skip verification unless a CA file is given".
    #[serde(default)]
    pub tls_skip_verify: Option<bool>,

    #[serde(default)]
    pub tls_ca_file: Option<String>,

    /// PEM client certificate for mTLS (paired with `tls_key_file`).
    #[serde(default)]
    pub tls_cert_file: Option<String>,

    #[serde(default)]
    pub tls_key_file: Option<String>,

    /// Look up partitions and memory usage in `system.query_log` after each query.
    #[serde(default)]
    pub query_log_stats: bool,

    #[serde(default = "default_connect_timeout_sec")]
    pub connect_timeout_sec: u64,
}

pub const PORT_HTTP: u16 = 8123;
pub const PORT_HTTPS: u16 = 8443;

fn default_port() -> u16 {
    PORT_HTTP
}

fn default_user() -> String {
    "default".to_string()
}

fn default_connect_timeout_sec() -> u64 {
    10
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            database: String::new(),
            user: default_user(),
            password: String::new(),
            table_name: String::new(),
            secure: false,
            tls_skip_verify: None,
            tls_ca_file: None,
            tls_cert_file: None,
            tls_key_file: None,
            query_log_stats: false,
            connect_timeout_sec: default_connect_timeout_sec(),
        }
    }
}

impl ClickHouseConfig {
    pub fn use_tls(&self) -> bool {
        self.secure || self.port == PORT_HTTPS
    }

    /// Certificate verification is skipped by default unless a CA is pinned.
    pub fn skip_verify(&self) -> bool {
        self.tls_skip_verify.unwrap_or(self.tls_ca_file.is_none())
    }
}

/// Values substituted into query templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestParams {
    #[serde(default, rename = "projectCode", alias = "project_code")]
    pub project_code: String,

    #[serde(default, rename = "appName", alias = "app_name")]
    pub app_name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub level: String,

    #[serde(default)]
    pub text_token: String,

    #[serde(default)]
    pub time_offset_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-task deadline; 0 disables it.
    #[serde(default)]
    pub query_timeout_sec: u64,
}

fn default_workers() -> usize {
    1
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            query_timeout_sec: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Json,
    Both,
}

impl ReportFormat {
    pub fn writes_html(self) -> bool {
        matches!(self, Self::Html | Self::Both)
    }

    pub fn writes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown report format: {other} (html, json or both)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,

    #[serde(default)]
    pub format: ReportFormat,

    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_output_path() -> String {
    "reports/report.html".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            format: ReportFormat::default(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Limits for the ok / warn / fail status column. Zero disables a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub granules_warn: u64,
    #[serde(default)]
    pub granules_fail: u64,
    #[serde(default)]
    pub read_rows_warn: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestConfig {
    #[serde(default)]
    pub query_name: String,

    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u64,

    /// 0 falls back to `execution.workers`.
    #[serde(default)]
    pub workers: usize,
}

fn default_duration_minutes() -> u64 {
    1
}

impl Default for StressTestConfig {
    fn default() -> Self {
        Self {
            query_name: String::new(),
            duration_minutes: default_duration_minutes(),
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: u64,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_request_timeout_sec() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_sec: default_request_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or `~/.clicktest/logs` if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "clicktest_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureCheck {
    pub name: String,

    /// partitions, indexes, projections, granules_settings
    #[serde(rename = "type")]
    pub check_type: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub query: String,

    #[serde(default)]
    pub collect_explain: bool,

    #[serde(default)]
    pub collect_stats: bool,
}
