use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clicktest_core::api::{RunResult, TaskResult};
use serde::Serialize;

use super::{ensure_parent, ReportMeta};

#[derive(Serialize)]
struct Export<'a> {
    meta: &'a ReportMeta,
    total: usize,
    passed: usize,
    failed: usize,
    results: &'a [TaskResult],
}

/// `report.html` becomes `report.json`; any other path gets `.json` appended.
pub fn json_path_for(html_path: &Path) -> PathBuf {
    match html_path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("html") => html_path.with_extension("json"),
        _ => {
            let mut raw = html_path.as_os_str().to_owned();
            raw.push(".json");
            PathBuf::from(raw)
        }
    }
}

pub fn write_json(path: &Path, run: &RunResult, meta: &ReportMeta) -> Result<()> {
    let export = Export {
        meta,
        total: run.total,
        passed: run.passed,
        failed: run.failed,
        results: &run.results,
    };
    let raw = serde_json::to_string_pretty(&export).context("serialize JSON report")?;
    ensure_parent(path)?;
    std::fs::write(path, raw).with_context(|| format!("write JSON report {}", path.display()))?;
    tracing::debug!(path = %path.display(), "JSON report written");
    Ok(())
}
