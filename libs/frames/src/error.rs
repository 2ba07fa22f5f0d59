/// Errors that abort converting a whole response.
///
/// Per-cell problems never show up here: they degrade to typed nulls
/// or to the JSON string fallback inside [`crate::ValueParser`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed ClickHouse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("column `{column}`: unable to parse timestamp from {value}")]
    InvalidTimestamp { column: String, value: String },

    #[error("column `{column}`: expected an array of [label, value] tuples, got {value}")]
    MalformedTuple { column: String, value: String },

    #[error("timezone lookup failed: {0}")]
    Timezone(String),
}

impl Error {
    pub fn timezone(msg: impl Into<String>) -> Self {
        Self::Timezone(msg.into())
    }
}
