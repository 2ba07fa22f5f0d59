//! Conversion of ClickHouse `FORMAT JSON` query results into typed frames.
//!
//! A response is decoded once, its columns are classified (label columns,
//! time column), and its rows are either grouped into named time series or
//! laid out as a table. Every cell goes through [`ValueParser`], which never
//! fails: undecodable cells become typed nulls. Only a bad time index or a
//! malformed `Array(Tuple(..))` cell aborts a conversion.

mod classify;
mod error;
mod frame;
mod parser;
mod response;
mod series;
mod table;
mod timezone;
pub mod types;
mod value;

pub use chrono_tz::Tz;

pub use classify::{Classification, ColumnMeta, classify};
pub use error::Error;
pub use frame::{Field, FieldValues, Frame};
pub use parser::{ParseStats, ValueParser};
pub use response::{Format, Response, Row, to_frames};
pub use timezone::{TimezoneFuture, TimezoneSource, parse_timezone, resolve_timezone};
pub use value::{TypedValue, ValueKind};
