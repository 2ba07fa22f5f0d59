use std::fmt;

use clickhouse_frames::{parse_timezone, Tz};
use grafana_plugin_sdk::backend;
use serde::Deserialize;

// ═══════════════════════════════════════════════════════════════
//  Datasource settings: jsonData + secureJsonData
// ═══════════════════════════════════════════════════════════════

pub(crate) type InstanceSettings =
    backend::DataSourceInstanceSettings<serde_json::Value, serde_json::Value>;

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasourceSettings {
    /// ClickHouse HTTP endpoint.
    pub url: String,
    pub username: String,
    /// Empty means the server's default database.
    pub database: String,
    pub tls_skip_verify: bool,
    /// Overrides the server timezone when set.
    pub timezone: String,
    /// From `secureJsonData`.
    #[serde(skip)]
    pub password: String,
}

impl Default for DatasourceSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            username: "default".to_string(),
            database: String::new(),
            tls_skip_verify: false,
            timezone: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for DatasourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasourceSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("database", &self.database)
            .field("tls_skip_verify", &self.tls_skip_verify)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl DatasourceSettings {
    pub fn from_instance(settings: Option<&InstanceSettings>) -> Self {
        settings
            .map(|s| Self::from_json(&s.json_data, &s.decrypted_secure_json_data))
            .unwrap_or_default()
    }

    /// Lenient: malformed `jsonData` falls back to defaults.
    pub fn from_json(json_data: &serde_json::Value, secure: &serde_json::Value) -> Self {
        let mut settings = if json_data.is_null() {
            Self::default()
        } else {
            serde_json::from_value(json_data.clone()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid datasource jsonData, using defaults");
                Self::default()
            })
        };
        if let Some(password) = secure.get("password").and_then(|v| v.as_str()) {
            settings.password = password.to_string();
        }
        settings.url = settings.url.trim_end_matches('/').to_string();
        settings
    }

    /// The configured timezone override, if any and valid.
    pub fn timezone_override(&self) -> Option<Tz> {
        if self.timezone.trim().is_empty() {
            return None;
        }
        parse_timezone(&self.timezone)
            .map_err(|e| tracing::warn!(error = %e, "ignoring timezone setting"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use clickhouse_frames::Tz;
    use serde_json::json;

    use super::DatasourceSettings;

    #[test]
    fn defaults_without_json_data() {
        let settings = DatasourceSettings::from_json(&serde_json::Value::Null, &json!({}));
        assert_eq!(settings.url, "http://localhost:8123");
        assert_eq!(settings.username, "default");
        assert!(settings.password.is_empty());
        assert_eq!(settings.timezone_override(), None);
    }

    #[test]
    fn reads_json_and_secure_data() {
        let settings = DatasourceSettings::from_json(
            &json!({
                "url": "https://ch.example.com:8443/",
                "username": "grafana",
                "database": "metrics",
                "tlsSkipVerify": true,
                "timezone": "Europe/Moscow"
            }),
            &json!({"password": "s3cret"}),
        );
        assert_eq!(settings.url, "https://ch.example.com:8443");
        assert_eq!(settings.username, "grafana");
        assert_eq!(settings.database, "metrics");
        assert!(settings.tls_skip_verify);
        assert_eq!(settings.password, "s3cret");
        assert_eq!(settings.timezone_override(), Some(Tz::Europe__Moscow));
        assert!(!format!("{settings:?}").contains("s3cret"));
    }

    #[test]
    fn malformed_json_data_uses_defaults() {
        let settings =
            DatasourceSettings::from_json(&json!({"url": 8123}), &serde_json::Value::Null);
        assert_eq!(settings.url, "http://localhost:8123");
    }

    #[test]
    fn invalid_timezone_is_ignored() {
        let settings = DatasourceSettings::from_json(&json!({"timezone": "Nowhere"}), &json!({}));
        assert_eq!(settings.timezone_override(), None);
    }
}
