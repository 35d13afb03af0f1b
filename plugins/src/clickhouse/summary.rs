use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decoded `X-ClickHouse-Summary` header. ClickHouse quotes 64-bit numbers,
/// so every counter accepts either a JSON string or a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Summary {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub read_rows: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub read_bytes: u64,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub memory_usage: Option<u64>,
}

impl Summary {
    pub fn parse(header: &str) -> Option<Self> {
        serde_json::from_str(header).ok()
    }
}

pub(crate) fn value_to_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(value_to_u64(&Value::deserialize(d)?).unwrap_or(0))
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(value_to_u64(&Value::deserialize(d)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_counters() {
        let s = Summary::parse(
            r#"{"read_rows":"8192","read_bytes":"65536","written_rows":"0","total_rows_to_read":"8192","elapsed_ns":"1200"}"#,
        )
        .unwrap();
        assert_eq!(s.read_rows, 8192);
        assert_eq!(s.read_bytes, 65536);
        assert_eq!(s.memory_usage, None);
    }

    #[test]
    fn test_parse_numeric_counters() {
        let s = Summary::parse(r#"{"read_rows":10,"read_bytes":20,"memory_usage":"4096"}"#).unwrap();
        assert_eq!(s.read_rows, 10);
        assert_eq!(s.read_bytes, 20);
        assert_eq!(s.memory_usage, Some(4096));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(Summary::parse("not json"), None);
        assert_eq!(Summary::parse("{}"), Some(Summary::default()));
    }
}
