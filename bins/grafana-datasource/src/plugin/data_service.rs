use futures::stream::FuturesOrdered;
use grafana_plugin_sdk::backend::{self, async_trait, BoxDataResponseStream, DataResponse};

use super::client::{ClickHouseClient, ServerTimezone};
use super::config::DatasourceSettings;
use super::error::QueryError;
use super::frame::to_grafana_frame;
use super::query::ClickHouseQuery;
use super::ClickHousePlugin;

// ═══════════════════════════════════════════════════════════════
//  DataService
// ═══════════════════════════════════════════════════════════════

#[async_trait]
impl backend::DataService for ClickHousePlugin {
    type Query = ClickHouseQuery;
    type QueryError = QueryError;
    type Stream = BoxDataResponseStream<Self::QueryError>;

    async fn query_data(
        &self,
        request: backend::QueryDataRequest<Self::Query, Self>,
    ) -> Self::Stream {
        let settings =
            DatasourceSettings::from_instance(request.plugin_context.instance_settings.as_ref());
        let ds_uid = request
            .plugin_context
            .instance_settings
            .as_ref()
            .map(|s| s.uid.clone())
            .unwrap_or_default();
        let fixed_tz = settings.timezone_override();
        let client = ClickHouseClient::new(&settings).map_err(|e| e.to_string());
        let timezones = self.timezones.clone();

        Box::pin(
            request
                .queries
                .into_iter()
                .map(|q| {
                    let client = client.clone();
                    let ds_uid = ds_uid.clone();
                    let timezones = timezones.clone();
                    async move {
                        let client =
                            client.map_err(|message| QueryError::new(&q.ref_id, message))?;
                        let timezone = ServerTimezone {
                            client: &client,
                            cache: &timezones,
                            uid: &ds_uid,
                            fixed: fixed_tz,
                        };
                        handle_query(&client, &timezone, &q).await
                    }
                })
                .collect::<FuturesOrdered<_>>(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════
//  Query handler
// ═══════════════════════════════════════════════════════════════

async fn handle_query(
    client: &ClickHouseClient,
    timezone: &ServerTimezone<'_>,
    query: &backend::DataQuery<ClickHouseQuery>,
) -> Result<DataResponse, QueryError> {
    let ref_id = query.ref_id.as_str();
    let Some(sql) = query.query.sql() else {
        return Err(QueryError::new(ref_id, "query is required"));
    };

    tracing::debug!(ref_id, %sql, "executing ClickHouse query");
    let body = client
        .exec(&sql)
        .await
        .map_err(|e| QueryError::new(ref_id, e.to_string()))?;

    let frames = clickhouse_frames::to_frames(ref_id, &body, query.query.format, timezone)
        .await
        .map_err(|e| QueryError::new(ref_id, e.to_string()))?;

    let grafana_frames: Vec<_> = frames.into_iter().map(to_grafana_frame).collect();
    let checked = grafana_frames
        .iter()
        .map(|frame| frame.check())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| QueryError::new(ref_id, format!("frame error: {e}")))?;

    Ok(DataResponse::new(ref_id.to_string(), checked))
}
