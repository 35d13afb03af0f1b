//! Run reports: a self-contained HTML page and a JSON export.

mod html;
mod json;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clicktest_core::api::{AppConfig, ReportConfig, RunResult, Thresholds};
use serde::Serialize;

pub use html::{row_status, write_html, RowStatus};
pub use json::{json_path_for, write_json};

/// Header information shown above the results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportMeta {
    pub generated_at: String,
    pub host: String,
    pub database: String,
    pub table: String,
    pub workers: usize,
    pub thresholds: Thresholds,
}

impl ReportMeta {
    pub fn from_config(cfg: &AppConfig, workers: usize) -> Self {
        Self {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            host: cfg.clickhouse.host.clone(),
            database: cfg.clickhouse.database.clone(),
            table: cfg.clickhouse.table_name.clone(),
            workers,
            thresholds: cfg.report.thresholds,
        }
    }
}

/// Writes the report files selected by `report.format` and returns their paths.
pub fn write_reports(run: &RunResult, meta: &ReportMeta, report: &ReportConfig) -> Result<Vec<PathBuf>> {
    let output = Path::new(&report.output_path);
    let mut written = Vec::new();

    if report.format.writes_html() {
        write_html(output, run, meta)?;
        written.push(output.to_path_buf());
    }
    if report.format.writes_json() {
        let path = json_path_for(output);
        write_json(&path, run, meta)?;
        written.push(path);
    }

    tracing::info!(files = written.len(), "reports written");
    Ok(written)
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report directory {}", parent.display()))?;
    }
    Ok(())
}
