use std::sync::LazyLock;

use clickhouse_frames::Format;
use regex::Regex;
use serde::Deserialize;

/// A trailing `FORMAT <name>` clause, optionally followed by `;`.
static FORMAT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bFORMAT\s+\w+\s*;?\s*$").expect("valid FORMAT clause pattern")
});

// ═══════════════════════════════════════════════════════════════
//  Query model: sent by the Grafana frontend
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickHouseQuery {
    /// SQL text, already macro-expanded by the frontend.
    #[serde(default)]
    pub query: String,
    /// `time_series` (auto-detect) or `table`.
    #[serde(default)]
    pub format: Format,
}

impl ClickHouseQuery {
    /// The SQL to send, asking for `FORMAT JSON` unless the query names a
    /// format itself. `None` for an empty query.
    pub fn sql(&self) -> Option<String> {
        let sql = self.query.trim().trim_end_matches(';').trim_end();
        if sql.is_empty() {
            return None;
        }
        if FORMAT_CLAUSE.is_match(sql) {
            Some(sql.to_string())
        } else {
            Some(format!("{sql} FORMAT JSON"))
        }
    }
}

#[cfg(test)]
mod tests {
    use clickhouse_frames::Format;
    use serde_json::json;

    use super::ClickHouseQuery;

    fn query(json: serde_json::Value) -> ClickHouseQuery {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn appends_format_json() {
        for (text, sql) in [
            ("SELECT 1", Some("SELECT 1 FORMAT JSON")),
            ("  SELECT 1;  ", Some("SELECT 1 FORMAT JSON")),
            ("SELECT 1 FORMAT JSON", Some("SELECT 1 FORMAT JSON")),
            ("select 1 format JSONCompact;", Some("select 1 format JSONCompact")),
            ("SELECT 'FORMAT' AS f", Some("SELECT 'FORMAT' AS f FORMAT JSON")),
            ("", None),
            (" ; ", None),
        ] {
            let q = query(json!({ "query": text }));
            assert_eq!(q.sql().as_deref(), sql, "Wrong SQL for '{text}'");
        }
    }

    #[test]
    fn reads_frontend_model() {
        let q = query(json!({
            "refId": "A",
            "datasource": {"type": "clickhouse", "uid": "abc"},
            "query": "SELECT 1",
            "format": "table"
        }));
        assert_eq!(q.format, Format::Table);

        let q = query(json!({ "refId": "B" }));
        assert_eq!(q.format, Format::TimeSeries);
        assert!(q.sql().is_none());
    }
}
