//! Decoding of raw JSON cells into [`TypedValue`]s.

use std::borrow::Cow;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::types::BaseType;
use crate::value::TypedValue;

const DATE_LAYOUT: &str = "%Y-%m-%d";
// `%.f` also accepts a missing fraction, which covers both DateTime and DateTime64.
const DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Counters for cells that did not decode into their declared type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Non-null cells that degraded to a typed null.
    pub nulls: usize,
    /// Cells of unmodeled types returned as JSON strings.
    pub fallbacks: usize,
}

/// Decodes cells of one response.
///
/// Never fails: a cell that cannot be decoded becomes a typed null, and a
/// cell of an unknown type becomes its JSON text.
#[derive(Debug)]
pub struct ValueParser {
    tz: Tz,
    stats: ParseStats,
}

impl ValueParser {
    /// `tz` is used for date/time columns whose type carries no zone of its own.
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            stats: ParseStats::default(),
        }
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    pub fn parse(&mut self, type_tag: &str, raw: &Value) -> TypedValue {
        let base = BaseType::of(type_tag);
        if raw.is_null() {
            return TypedValue::null(base.kind());
        }

        let parsed = match base {
            BaseType::Numeric => TypedValue::Float64(to_f64(raw)),
            BaseType::UInt64 => TypedValue::UInt64(to_u64(raw)),
            BaseType::Int64 => TypedValue::Int64(to_i64(raw)),
            BaseType::Text => TypedValue::String(Some(to_text(raw).into_owned())),
            BaseType::Date => TypedValue::Time(parse_time(raw, Layout::Date, self.tz)),
            BaseType::DateTime { tz } => {
                TypedValue::Time(parse_time(raw, Layout::DateTime, tz.unwrap_or(self.tz)))
            }
            BaseType::Other => return self.fallback(raw),
        };
        if parsed.is_null() {
            self.stats.nulls += 1;
        }
        parsed
    }

    /// Decode a cell of the column that indexes a time series.
    ///
    /// Date/time columns decode as usual. The legacy `t` integer column holds
    /// epoch milliseconds.
    pub fn parse_time_index(&mut self, type_tag: &str, raw: &Value) -> TypedValue {
        if BaseType::of(type_tag).is_time() {
            return self.parse(type_tag, raw);
        }
        let time = to_i64(raw).and_then(DateTime::from_timestamp_millis);
        if time.is_none() && !raw.is_null() {
            self.stats.nulls += 1;
        }
        TypedValue::Time(time)
    }

    fn fallback(&mut self, raw: &Value) -> TypedValue {
        match serde_json::to_string(raw) {
            Ok(json) => {
                self.stats.fallbacks += 1;
                TypedValue::String(Some(json))
            }
            Err(e) => {
                tracing::warn!(error = %e, "unable to encode cell as JSON, using null");
                self.stats.nulls += 1;
                TypedValue::String(None)
            }
        }
    }
}

fn to_text(raw: &Value) -> Cow<'_, str> {
    match raw {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

fn to_f64(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

// 64-bit integers are quoted by ClickHouse by default, but may also come
// through as plain JSON numbers; neither path goes through f64.
fn to_u64(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_i64(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug)]
enum Layout {
    Date,
    DateTime,
}

/// Parse with `layout` in `tz`, then fall back to integer epoch seconds.
fn parse_time(raw: &Value, layout: Layout, tz: Tz) -> Option<DateTime<Utc>> {
    let text = to_text(raw);
    let text = text.trim();
    let naive = match layout {
        Layout::Date => NaiveDate::parse_from_str(text, DATE_LAYOUT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        Layout::DateTime => NaiveDateTime::parse_from_str(text, DATE_TIME_LAYOUT).ok(),
    };
    if let Some(naive) = naive {
        return local_to_utc(naive, tz);
    }
    text.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Ambiguous local times resolve to the earlier instant. Times inside a
/// daylight-saving gap are moved forward past the gap.
fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => local,
        LocalResult::None => tz
            .from_local_datetime(&naive.checked_add_signed(TimeDelta::hours(1))?)
            .earliest()?,
    };
    Some(local.with_timezone(&Utc))
}
