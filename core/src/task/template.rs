use crate::config::TestParams;

/// Cache-busting token. Batch tasks substitute the configured offset; the
/// stress engine substitutes a fresh value per call.
pub const TIME_OFFSET_PLACEHOLDER: &str = "$time_offset_ms$";

/// Replaces every placeholder, including `$time_offset_ms$`.
///
/// `full_table` is the value for `$table_name$`, e.g. `logs_db.app_logs_v10`.
pub fn substitute_query_params(query: &str, full_table: &str, params: &TestParams) -> String {
    substitute(query, full_table, params, true)
}

/// Replaces every placeholder except `$time_offset_ms$`, which the stress
/// engine fills in per call.
pub fn substitute_query_params_for_stress(
    query: &str,
    full_table: &str,
    params: &TestParams,
) -> String {
    substitute(query, full_table, params, false)
}

fn substitute(query: &str, full_table: &str, p: &TestParams, include_offset: bool) -> String {
    let offset = p.time_offset_ms.to_string();
    let mut replacements: Vec<(&str, &str)> = vec![
        ("$table_name$", full_table),
        ("$projectCode$", p.project_code.as_str()),
        ("$appName$", p.app_name.as_str()),
        ("$namespace$", p.namespace.as_str()),
        ("$level$", p.level.as_str()),
        ("$text_token$", p.text_token.as_str()),
    ];
    if include_offset {
        replacements.push((TIME_OFFSET_PLACEHOLDER, offset.as_str()));
    }

    replacements
        .into_iter()
        .fold(query.to_string(), |acc, (token, value)| {
            acc.replace(token, value)
        })
}

/// Escapes a value for use inside a single-quoted SQL string literal.
pub(crate) fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', "\\'")
}

/// Backtick-quotes an identifier when it is empty or contains characters
/// that would break a bare identifier.
pub(crate) fn escape_identifier(s: &str) -> String {
    const SPECIAL: &[char] = &[' ', '\t', '\n', '\r', '"', '\'', '`', ';'];
    if s.is_empty() || s.contains(SPECIAL) {
        format!("`{}`", s.replace('`', "``"))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TestParams {
        TestParams {
            project_code: "PRJ".into(),
            app_name: "billing".into(),
            namespace: "prod".into(),
            level: "ERROR".into(),
            text_token: "timeout".into(),
            time_offset_ms: 0,
        }
    }

    #[test]
    fn test_substitutes_all_tokens() {
        let q = "SELECT count() FROM $table_name$ WHERE project = '$projectCode$' \
                 AND app = '$appName$' AND ns = '$namespace$' AND level = '$level$' \
                 AND hasToken(message, '$text_token$') AND ts < now() - $time_offset_ms$";
        let out = substitute_query_params(q, "logs.app", &params());
        assert_eq!(
            out,
            "SELECT count() FROM logs.app WHERE project = 'PRJ' AND app = 'billing' \
             AND ns = 'prod' AND level = 'ERROR' AND hasToken(message, 'timeout') \
             AND ts < now() - 0"
        );
    }

    #[test]
    fn test_stress_variant_keeps_offset_token() {
        let q = "SELECT * FROM $table_name$ WHERE ts < now64() - $time_offset_ms$";
        let out = substitute_query_params_for_stress(q, "logs.app", &params());
        assert_eq!(out, "SELECT * FROM logs.app WHERE ts < now64() - $time_offset_ms$");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_single_quotes("o'neil"), "o\\'neil");
        assert_eq!(escape_identifier("app_logs"), "app_logs");
        assert_eq!(escape_identifier("my table"), "`my table`");
        assert_eq!(escape_identifier("we`ird"), "`we``ird`");
        assert_eq!(escape_identifier(""), "``");
    }
}
