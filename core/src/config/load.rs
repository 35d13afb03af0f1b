use std::path::Path;

use crate::error::ConfigError;

use super::types::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Reads, parses, validates and defaults the config at `path`.
///
/// Environment overrides (`CLICKTEST_HOST`, `CLICKTEST_PORT`, `CLICKTEST_USER`,
/// `CLICKTEST_PASSWORD`) are applied before validation.
pub fn load(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg = parse_str(&raw, ConfigFormat::from_path(path))?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    validate(&cfg)?;
    set_defaults(&mut cfg);
    tracing::debug!(
        path = %path.display(),
        structure_checks = cfg.structure_checks.len(),
        query_templates = cfg.query_templates.len(),
        "config loaded"
    );
    Ok(cfg)
}

pub fn parse_str(raw: &str, format: ConfigFormat) -> Result<AppConfig, ConfigError> {
    let cfg = match format {
        ConfigFormat::Toml => toml::from_str::<AppConfig>(raw)?,
        ConfigFormat::Json => serde_json::from_str::<AppConfig>(raw)?,
    };
    Ok(cfg)
}

/// Applies `CLICKTEST_*` overrides. `lookup` is injectable for tests.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("CLICKTEST_HOST") {
        cfg.clickhouse.host = v;
    }
    if let Some(v) = non_empty("CLICKTEST_PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => cfg.clickhouse.port = port,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid CLICKTEST_PORT"),
        }
    }
    if let Some(v) = non_empty("CLICKTEST_USER") {
        cfg.clickhouse.user = v;
    }
    if let Some(v) = lookup("CLICKTEST_PASSWORD") {
        cfg.clickhouse.password = v;
    }
}

fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.clickhouse.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "clickhouse.host is required".to_string(),
        ));
    }
    if cfg.clickhouse.database.trim().is_empty() {
        return Err(ConfigError::Validation(
            "clickhouse.database is required".to_string(),
        ));
    }
    if cfg.structure_checks.is_empty() && cfg.query_templates.is_empty() {
        return Err(ConfigError::Validation(
            "at least one structure_checks or query_templates entry is required".to_string(),
        ));
    }
    if let Some(sc) = cfg.structure_checks.iter().find(|s| s.name.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "structure check of type {:?} has an empty name",
            sc.check_type
        )));
    }
    if let Some(qt) = cfg.query_templates.iter().find(|q| q.name.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "query template {:?} has an empty name",
            qt.query
        )));
    }
    if let (Some(_), None) | (None, Some(_)) =
        (&cfg.clickhouse.tls_cert_file, &cfg.clickhouse.tls_key_file)
    {
        return Err(ConfigError::Validation(
            "clickhouse.tls_cert_file and clickhouse.tls_key_file must be set together"
                .to_string(),
        ));
    }
    Ok(())
}

fn set_defaults(cfg: &mut AppConfig) {
    if cfg.clickhouse.port == 0 {
        cfg.clickhouse.port = super::types::PORT_HTTP;
    }
    if cfg.execution.workers == 0 {
        cfg.execution.workers = 1;
    }
    if cfg.report.output_path.trim().is_empty() {
        cfg.report.output_path = "reports/report.html".to_string();
    }
    if cfg.server.port == 0 {
        cfg.server.port = 8080;
    }
}
