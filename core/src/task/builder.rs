use crate::config::AppConfig;
use crate::error::ConfigError;

use super::template::{
    escape_identifier, escape_single_quotes, substitute_query_params,
    substitute_query_params_for_stress,
};
use super::types::{Task, TaskKind, TaskOpts};

/// Builds the task list from `structure_checks` followed by `query_templates`.
///
/// Ids start at 1 and follow config order. Structure checks get `database`
/// and `table_name` from the connection section; query templates get every
/// placeholder substituted.
pub fn build_tasks(cfg: &AppConfig) -> Result<Vec<Task>, ConfigError> {
    let db = &cfg.clickhouse.database;
    let table = &cfg.clickhouse.table_name;
    let full_table = cfg.full_table();

    let mut out = Vec::with_capacity(cfg.structure_checks.len() + cfg.query_templates.len());
    let mut id: u32 = 1;

    for sc in &cfg.structure_checks {
        let sql = structure_query(&sc.check_type, db, table).ok_or_else(|| {
            ConfigError::UnknownStructureCheck {
                name: sc.name.clone(),
                check_type: sc.check_type.clone(),
            }
        })?;
        let description = if sc.description.trim().is_empty() {
            structure_description(&sc.check_type).to_string()
        } else {
            sc.description.clone()
        };
        out.push(Task {
            id,
            name: sc.name.clone(),
            description,
            kind: TaskKind::StructureCheck,
            sql,
            opts: TaskOpts::default(),
        });
        id += 1;
    }

    for qt in &cfg.query_templates {
        out.push(Task {
            id,
            name: qt.name.clone(),
            description: qt.description.clone(),
            kind: TaskKind::Query,
            sql: substitute_query_params(&qt.query, &full_table, &cfg.test_params),
            opts: TaskOpts {
                collect_explain: qt.collect_explain,
                collect_stats: qt.collect_stats,
            },
        });
        id += 1;
    }

    Ok(out)
}

/// Returns the stress query for the named template with every placeholder
/// substituted except `$time_offset_ms$`.
pub fn stress_query_by_name(cfg: &AppConfig, query_name: &str) -> Result<String, ConfigError> {
    let full_table = cfg.full_table();
    cfg.query_templates
        .iter()
        .find(|qt| qt.name == query_name)
        .map(|qt| substitute_query_params_for_stress(&qt.query, &full_table, &cfg.test_params))
        .ok_or_else(|| ConfigError::TemplateNotFound(query_name.to_string()))
}

fn structure_query(check_type: &str, database: &str, table: &str) -> Option<String> {
    let db_lit = escape_single_quotes(database);
    let table_lit = escape_single_quotes(table);
    let sql = match check_type {
        "partitions" => format!(
            "SELECT partition, sum(rows) AS rows, sum(bytes_on_disk) AS bytes FROM system.parts \
             WHERE database = '{db_lit}' AND table = '{table_lit}' AND active \
             GROUP BY partition ORDER BY partition"
        ),
        "indexes" => format!(
            "SELECT name, type, expr, granularity FROM system.data_skipping_indices \
             WHERE database = '{db_lit}' AND table = '{table_lit}'"
        ),
        "projections" => format!(
            "SELECT name, partition, part_type, rows FROM system.projection_parts \
             WHERE database = '{db_lit}' AND table = '{table_lit}'"
        ),
        "granules_settings" => format!(
            "SHOW CREATE TABLE {}.{}",
            escape_identifier(database),
            escape_identifier(table)
        ),
        _ => return None,
    };
    Some(sql)
}

fn structure_description(check_type: &str) -> &'static str {
    match check_type {
        "partitions" => "Partitions present for the table (system.parts).",
        "indexes" => "Data skipping indexes and their types (bloom_filter, tokenbf_v1).",
        "projections" => "Projections present for the table.",
        "granules_settings" => "Granule settings (SHOW CREATE TABLE).",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_str, ConfigFormat};
    use pretty_assertions::assert_eq;

    const CFG: &str = r#"
[clickhouse]
host = "localhost"
database = "logs_db"
table_name = "app_logs"

[test_params]
projectCode = "PRJ"
time_offset_ms = 0

[[structure_checks]]
name = "parts"
type = "partitions"

[[structure_checks]]
name = "create"
type = "granules_settings"
description = "custom"

[[query_templates]]
name = "by_project"
query = "SELECT count() FROM $table_name$ WHERE project = '$projectCode$' AND ts < now() - $time_offset_ms$"
collect_explain = true
collect_stats = true
"#;

    fn cfg() -> AppConfig {
        parse_str(CFG, ConfigFormat::Toml).unwrap()
    }

    #[test]
    fn test_ids_follow_config_order() {
        let tasks = build_tasks(&cfg()).unwrap();
        let ids: Vec<u32> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(tasks[0].kind, TaskKind::StructureCheck);
        assert_eq!(tasks[2].kind, TaskKind::Query);
    }

    #[test]
    fn test_structure_queries_and_descriptions() {
        let tasks = build_tasks(&cfg()).unwrap();
        assert!(tasks[0].sql.contains("FROM system.parts"));
        assert!(tasks[0].sql.contains("database = 'logs_db' AND table = 'app_logs'"));
        assert_eq!(
            tasks[0].description,
            "Partitions present for the table (system.parts)."
        );
        assert_eq!(tasks[1].sql, "SHOW CREATE TABLE logs_db.app_logs");
        assert_eq!(tasks[1].description, "custom");
    }

    #[test]
    fn test_query_template_substituted() {
        let tasks = build_tasks(&cfg()).unwrap();
        assert_eq!(
            tasks[2].sql,
            "SELECT count() FROM logs_db.app_logs WHERE project = 'PRJ' AND ts < now() - 0"
        );
        assert!(tasks[2].opts.collect_explain);
        assert!(tasks[2].opts.collect_stats);
    }

    #[test]
    fn test_unknown_structure_check_rejected() {
        let mut cfg = cfg();
        cfg.structure_checks[0].check_type = "ttl".into();
        let err = build_tasks(&cfg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "structure check \"parts\": unknown structure check type: ttl"
        );
    }

    #[test]
    fn test_stress_query_keeps_offset() {
        let q = stress_query_by_name(&cfg(), "by_project").unwrap();
        assert!(q.contains("$time_offset_ms$"));
        assert!(q.contains("logs_db.app_logs"));

        let err = stress_query_by_name(&cfg(), "missing").unwrap_err();
        assert!(matches!(err, ConfigError::TemplateNotFound(_)));
    }
}
