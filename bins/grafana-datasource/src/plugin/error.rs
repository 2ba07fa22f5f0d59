use grafana_plugin_sdk::backend;

// ═══════════════════════════════════════════════════════════════
//  Error types
// ═══════════════════════════════════════════════════════════════

/// Grafana plugin error for individual queries.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub ref_id: String,
    pub message: String,
}

impl QueryError {
    pub fn new(ref_id: &str, message: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.to_string(),
            message: message.into(),
        }
    }
}

impl backend::DataQueryError for QueryError {
    fn ref_id(self) -> String {
        self.ref_id
    }
}

/// Error type for ClickHouse HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client: {0}")]
    Build(String),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("ClickHouse HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
