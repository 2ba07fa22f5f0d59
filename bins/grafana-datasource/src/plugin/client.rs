use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use clickhouse_frames::{
    parse_timezone, Error as FramesError, Response, TimezoneFuture, TimezoneSource, Tz,
};

use super::config::DatasourceSettings;
use super::error::ClientError;

const TIMEZONE_SQL: &str = "SELECT timezone() AS tz FORMAT JSON";

// ═══════════════════════════════════════════════════════════════
//  ClickHouse HTTP client
// ═══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub(crate) struct ClickHouseClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    database: String,
}

impl ClickHouseClient {
    pub fn new(settings: &DatasourceSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(settings.tls_skip_verify)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.url.clone(),
            user: settings.username.clone(),
            password: settings.password.clone(),
            database: settings.database.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `sql` and return the raw response body.
    pub async fn exec(&self, sql: &str) -> Result<Bytes, ClientError> {
        let mut params = vec![("user", self.user.as_str()), ("password", self.password.as_str())];
        if !self.database.is_empty() {
            params.push(("database", self.database.as_str()));
        }

        let resp = self
            .http
            .post(&self.base_url)
            .query(&params)
            .body(sql.to_owned())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }
        Ok(body)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Server timezone: cached per datasource UID
// ═══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub(crate) struct TimezoneCache(Arc<RwLock<HashMap<String, Tz>>>);

impl TimezoneCache {
    pub fn get(&self, uid: &str) -> Option<Tz> {
        self.0.read().ok()?.get(uid).copied()
    }

    pub fn insert(&self, uid: &str, tz: Tz) {
        if let Ok(mut map) = self.0.write() {
            map.insert(uid.to_string(), tz);
        }
    }
}

/// Timezone lookup for one datasource: the configured override, then the
/// cache, then `SELECT timezone()`.
pub(crate) struct ServerTimezone<'a> {
    pub client: &'a ClickHouseClient,
    pub cache: &'a TimezoneCache,
    pub uid: &'a str,
    pub fixed: Option<Tz>,
}

impl TimezoneSource for ServerTimezone<'_> {
    fn fetch_timezone(&self) -> TimezoneFuture<'_> {
        Box::pin(async move {
            if let Some(tz) = self.fixed {
                return Ok(tz);
            }
            if let Some(tz) = self.cache.get(self.uid) {
                return Ok(tz);
            }

            let body = self
                .client
                .exec(TIMEZONE_SQL)
                .await
                .map_err(|e| FramesError::timezone(e.to_string()))?;
            let tz = timezone_from_body(&body)?;
            tracing::debug!(uid = %self.uid, %tz, "fetched ClickHouse server timezone");
            self.cache.insert(self.uid, tz);
            Ok(tz)
        })
    }
}

fn timezone_from_body(body: &[u8]) -> Result<Tz, FramesError> {
    let response = Response::from_slice(body)?;
    let name = response
        .data
        .first()
        .and_then(|row| row.get("tz"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| FramesError::timezone("empty timezone() result"))?;
    parse_timezone(name)
}

#[cfg(test)]
mod tests {
    use clickhouse_frames::{resolve_timezone, Tz};

    use super::{timezone_from_body, ClickHouseClient, ServerTimezone, TimezoneCache};
    use crate::plugin::config::DatasourceSettings;

    #[test]
    fn parses_timezone_response() {
        let body = br#"{
            "meta": [{"name": "tz", "type": "String"}],
            "data": [{"tz": "Europe/Moscow"}],
            "rows": 1
        }"#;
        assert_eq!(timezone_from_body(body).unwrap(), Tz::Europe__Moscow);
        assert!(timezone_from_body(br#"{"meta": [], "data": []}"#).is_err());
        assert!(timezone_from_body(b"Code: 60. DB::Exception").is_err());
    }

    #[tokio::test]
    async fn override_and_cache_skip_the_server() {
        // Nothing listens on this port; any request would fail and yield UTC.
        let settings = DatasourceSettings {
            url: "http://127.0.0.1:9".to_string(),
            ..DatasourceSettings::default()
        };
        let client = ClickHouseClient::new(&settings).unwrap();
        let cache = TimezoneCache::default();

        let fixed = ServerTimezone {
            client: &client,
            cache: &cache,
            uid: "ds",
            fixed: Some(Tz::Asia__Tokyo),
        };
        assert_eq!(resolve_timezone(&fixed).await, Tz::Asia__Tokyo);

        cache.insert("ds", Tz::Europe__Berlin);
        let cached = ServerTimezone {
            client: &client,
            cache: &cache,
            uid: "ds",
            fixed: None,
        };
        assert_eq!(resolve_timezone(&cached).await, Tz::Europe__Berlin);

        let unreachable = ServerTimezone {
            client: &client,
            cache: &cache,
            uid: "other",
            fixed: None,
        };
        assert_eq!(resolve_timezone(&unreachable).await, Tz::UTC);
    }
}
