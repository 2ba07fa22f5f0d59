mod client;
mod config;
mod data_service;
mod error;
mod frame;
mod query;

use grafana_plugin_sdk::backend::{self, async_trait};
use grafana_plugin_sdk::prelude::*;

use client::{ClickHouseClient, TimezoneCache};
use config::DatasourceSettings;

// ═══════════════════════════════════════════════════════════════
//  Plugin struct
// ═══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, GrafanaPlugin)]
#[grafana_plugin(plugin_type = "datasource")]
pub struct ClickHousePlugin {
    /// Server timezones by datasource UID.
    timezones: TimezoneCache,
}

impl ClickHousePlugin {
    pub fn new() -> Self {
        Self {
            timezones: TimezoneCache::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  DiagnosticsService
// ═══════════════════════════════════════════════════════════════

#[async_trait]
impl backend::DiagnosticsService for ClickHousePlugin {
    type CheckHealthError = std::convert::Infallible;
    type CollectMetricsError = std::convert::Infallible;

    async fn check_health(
        &self,
        request: backend::CheckHealthRequest<Self>,
    ) -> Result<backend::CheckHealthResponse, Self::CheckHealthError> {
        let settings =
            DatasourceSettings::from_instance(request.plugin_context.instance_settings.as_ref());
        let client = match ClickHouseClient::new(&settings) {
            Ok(client) => client,
            Err(e) => return Ok(backend::CheckHealthResponse::error(e.to_string())),
        };

        match client.exec("SELECT 1").await {
            Ok(_) => Ok(backend::CheckHealthResponse::ok(format!(
                "Connected to ClickHouse at {}",
                client.base_url(),
            ))),
            Err(e) => {
                tracing::warn!(url = %client.base_url(), error = %e, "health check failed");
                Ok(backend::CheckHealthResponse::error(format!(
                    "Failed to query ClickHouse at {}: {e}",
                    client.base_url(),
                )))
            }
        }
    }

    async fn collect_metrics(
        &self,
        _request: backend::CollectMetricsRequest<Self>,
    ) -> Result<backend::CollectMetricsResponse, Self::CollectMetricsError> {
        Ok(backend::CollectMetricsResponse::new(None))
    }
}
