//! The `FORMAT JSON` envelope and its conversion into frames.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{ColumnMeta, classify};
use crate::error::Error;
use crate::frame::Frame;
use crate::parser::ValueParser;
use crate::series::SeriesAssembler;
use crate::table::TableAssembler;
use crate::timezone::{TimezoneSource, resolve_timezone};
use crate::types;

/// One result row, keyed by column name. Key order carries no meaning.
pub type Row = serde_json::Map<String, Value>;

/// Requested output shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Time series when a time column is found, otherwise a table.
    #[default]
    TimeSeries,
    /// Always a table, even if a time column exists.
    Table,
}

/// A decoded ClickHouse `FORMAT JSON` response.
#[derive(Clone, Debug, Deserialize)]
pub struct Response {
    pub meta: Vec<ColumnMeta>,
    pub data: Vec<Row>,
    /// Row count reported by the server; informational only.
    #[serde(default)]
    pub rows: Option<u64>,
}

impl Response {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// True if some column needs the server timezone to be decoded.
    pub fn needs_timezone(&self) -> bool {
        self.meta.iter().any(|c| types::is_time_type(&c.r#type))
    }

    /// Convert into frames, asking `source` for the timezone at most once
    /// and only when a date/time column is present.
    pub async fn to_frames<S>(
        &self,
        ref_id: &str,
        format: Format,
        source: &S,
    ) -> Result<Vec<Frame>, Error>
    where
        S: TimezoneSource + ?Sized,
    {
        let tz = if self.needs_timezone() {
            resolve_timezone(source).await
        } else {
            Tz::UTC
        };
        self.to_frames_in(ref_id, format, tz)
    }

    /// Convert into frames with an already resolved timezone.
    pub fn to_frames_in(&self, ref_id: &str, format: Format, tz: Tz) -> Result<Vec<Frame>, Error> {
        let classes = classify(&self.meta);
        let mut parser = ValueParser::new(tz);

        let frames = match (format, classes.timestamp_column) {
            (Format::TimeSeries, Some(time_index)) => {
                let mut series = SeriesAssembler::new(ref_id, &self.meta, &classes, time_index);
                for row in &self.data {
                    series.push_row(row, &mut parser)?;
                }
                series.finish()
            }
            _ => {
                let mut table = TableAssembler::new(ref_id, &self.meta);
                for row in &self.data {
                    table.push_row(row, &mut parser);
                }
                table.finish()
            }
        };

        let stats = parser.stats();
        tracing::debug!(
            ref_id,
            rows = self.data.len(),
            frames = frames.len(),
            null_cells = stats.nulls,
            fallback_cells = stats.fallbacks,
            "converted ClickHouse response"
        );
        Ok(frames)
    }
}

/// Decode a `FORMAT JSON` body and convert it into frames tagged with `ref_id`.
pub async fn to_frames<S>(
    ref_id: &str,
    body: &[u8],
    format: Format,
    source: &S,
) -> Result<Vec<Frame>, Error>
where
    S: TimezoneSource + ?Sized,
{
    Response::from_slice(body)?
        .to_frames(ref_id, format, source)
        .await
}
