use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use clicktest_core::api::{RunResult, TaskKind, TaskResult, Thresholds};

use super::{ensure_parent, ReportMeta};

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; margin: 1rem 2rem; background: #f5f5f5; }
    h1 { color: #222; }
    .meta { color: #666; font-size: 0.9rem; margin-bottom: 1rem; }
    .summary { margin: 1rem 0; padding: 1rem; background: #fff; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }
    .summary span { margin-right: 1.5rem; }
    table { border-collapse: collapse; width: 100%; background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }
    th, td { padding: 0.5rem 0.75rem; text-align: left; border-bottom: 1px solid #eee; vertical-align: top; }
    th { background: #374151; color: #fff; font-weight: 600; }
    tr:hover { background: #f9fafb; }
    .status-ok { color: #059669; font-weight: 600; }
    .status-warn { color: #d97706; font-weight: 600; }
    .status-fail { color: #dc2626; font-weight: 600; }
    .error { color: #dc2626; font-size: 0.85rem; max-width: 40em; }
    .explain { font-size: 0.8rem; white-space: pre-wrap; max-height: 8em; overflow: auto; background: #f9fafb; padding: 0.5rem; }
"#;

const NONE: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Ok,
    Warn,
    Fail,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

/// Status column for one result. A zero threshold is disabled.
pub fn row_status(res: &TaskResult, t: &Thresholds) -> RowStatus {
    if !res.pass {
        return RowStatus::Fail;
    }
    if t.granules_fail > 0 && res.granules >= t.granules_fail {
        return RowStatus::Fail;
    }
    if (t.granules_warn > 0 && res.granules >= t.granules_warn)
        || (t.read_rows_warn > 0 && res.read_rows >= t.read_rows_warn)
    {
        return RowStatus::Warn;
    }
    RowStatus::Ok
}

pub fn write_html(path: &Path, run: &RunResult, meta: &ReportMeta) -> Result<()> {
    let page = render(run, meta);
    ensure_parent(path)?;
    std::fs::write(path, page).with_context(|| format!("write HTML report {}", path.display()))?;
    tracing::debug!(path = %path.display(), "HTML report written");
    Ok(())
}

fn render(run: &RunResult, meta: &ReportMeta) -> String {
    let mut out = String::with_capacity(4096 + run.results.len() * 512);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n");
    out.push_str("  <title>ClickHouse Table Structure Test Report</title>\n  <style>");
    out.push_str(STYLE);
    out.push_str("  </style>\n</head>\n<body>\n  <h1>ClickHouse Table Structure Test Report</h1>\n");

    let _ = write!(out, "  <div class=\"meta\">Generated: {}", escape(&meta.generated_at));
    for (label, value) in [("Host", &meta.host), ("Database", &meta.database), ("Table", &meta.table)] {
        if !value.is_empty() {
            let _ = write!(out, " | {label}: {}", escape(value));
        }
    }
    if meta.workers > 0 {
        let _ = write!(out, " | Workers: {}", meta.workers);
    }
    out.push_str("</div>\n");

    let _ = writeln!(
        out,
        "  <div class=\"summary\"><span><strong>Total:</strong> {}</span>\
         <span><strong>Passed:</strong> <span class=\"status-ok\">{}</span></span>\
         <span><strong>Failed:</strong> <span class=\"status-fail\">{}</span></span></div>",
        run.total, run.passed, run.failed
    );

    out.push_str(
        "  <table>\n    <thead><tr><th>#</th><th>Name</th><th>Description</th><th>Type</th>\
         <th>Status</th><th>Granules</th><th>Read Rows</th><th>Read MB</th>\
         <th>Duration (ms)</th><th>Rows</th><th>Error / Details</th></tr></thead>\n    <tbody>\n",
    );
    for res in &run.results {
        render_row(&mut out, res, &meta.thresholds);
    }
    out.push_str("    </tbody>\n  </table>\n</body>\n</html>\n");
    out
}

fn render_row(out: &mut String, res: &TaskResult, thresholds: &Thresholds) {
    let is_query = res.kind == TaskKind::Query;
    let status = row_status(res, thresholds).as_str();
    let query_only = |v: u64| if is_query { v.to_string() } else { NONE.to_string() };
    let read_mb = if res.read_bytes > 0 {
        format!("{:.2}", res.read_bytes as f64 / (1024.0 * 1024.0))
    } else if is_query {
        "0.00".to_string()
    } else {
        NONE.to_string()
    };
    let duration = if res.duration_ms > 0.0 {
        format!("{:.2}", res.duration_ms)
    } else {
        NONE.to_string()
    };

    let _ = write!(
        out,
        "      <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
         <td><span class=\"status-{status}\">{status}</span></td>\
         <td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>",
        res.task_id,
        escape(&res.name),
        escape(&res.description),
        res.kind,
        query_only(res.granules),
        query_only(res.read_rows),
        read_mb,
        duration,
        query_only(res.rows_returned),
    );
    match (&res.error, &res.explain_text) {
        (Some(err), _) => {
            let _ = write!(out, "<span class=\"error\">{}</span>", escape(err));
        }
        (None, Some(explain)) if !explain.is_empty() => {
            let _ = write!(
                out,
                "<details><summary>EXPLAIN</summary><div class=\"explain\">{}</div></details>",
                escape(explain)
            );
        }
        _ => {}
    }
    out.push_str("</td></tr>\n");
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clicktest_core::api::{Task, TaskOpts};

    fn passed(granules: u64, read_rows: u64) -> TaskResult {
        let task = Task::query(1, "q", "SELECT 1", TaskOpts::default());
        TaskResult {
            pass: true,
            granules,
            read_rows,
            ..TaskResult::pending(&task)
        }
    }

    #[test]
    fn test_row_status_thresholds() {
        let t = Thresholds {
            granules_warn: 10,
            granules_fail: 100,
            read_rows_warn: 1_000_000,
        };
        assert_eq!(row_status(&passed(5, 10), &t), RowStatus::Ok);
        assert_eq!(row_status(&passed(10, 10), &t), RowStatus::Warn);
        assert_eq!(row_status(&passed(5, 1_000_000), &t), RowStatus::Warn);
        assert_eq!(row_status(&passed(100, 10), &t), RowStatus::Fail);

        let mut failed = passed(0, 0);
        failed.pass = false;
        assert_eq!(row_status(&failed, &t), RowStatus::Fail);
    }

    #[test]
    fn test_zero_thresholds_disabled() {
        assert_eq!(row_status(&passed(u64::MAX, u64::MAX), &Thresholds::default()), RowStatus::Ok);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"a\" & 'b'</b>"), "&lt;b&gt;&#34;a&#34; &amp; &#39;b&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_render_escapes_and_shows_explain() {
        let task = Task::query(7, "<script>alert(1)</script>", "SELECT 1", TaskOpts::default());
        let mut ok = TaskResult::pending(&task);
        ok.pass = true;
        ok.explain_text = Some("Granules: 3/10 <x>".to_string());
        let structure = Task::structure(8, "partitions", "SELECT 2");
        let bad = TaskResult::failed(&structure, "code: 60, message: Table a<b does not exist");
        let run = RunResult::from_results(vec![ok, bad]);
        let meta = ReportMeta {
            host: "ch&co".to_string(),
            ..Default::default()
        };

        let page = render(&run, &meta);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("Host: ch&amp;co"));
        assert!(page.contains("<details><summary>EXPLAIN</summary>"));
        assert!(page.contains("Granules: 3/10 &lt;x&gt;"));
        assert!(page.contains("Table a&lt;b does not exist"));
        assert!(page.contains("status-fail\">fail"));
        assert!(page.contains("<strong>Total:</strong> 2"));
    }
}
