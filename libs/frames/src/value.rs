use std::fmt;

use chrono::{DateTime, Utc};

/// Output type of a parsed cell. Every field holds values of exactly one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Float64,
    Int64,
    UInt64,
    String,
    Time,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Float64 => "float64",
            ValueKind::Int64 => "int64",
            ValueKind::UInt64 => "uint64",
            ValueKind::String => "string",
            ValueKind::Time => "time",
        };
        f.write_str(name)
    }
}

/// A decoded cell.
///
/// `None` inside a variant is a typed null: the cell had no usable value
/// but still belongs to a field of that kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Float64(Option<f64>),
    Int64(Option<i64>),
    UInt64(Option<u64>),
    String(Option<String>),
    Time(Option<DateTime<Utc>>),
}

impl TypedValue {
    pub fn null(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Float64 => TypedValue::Float64(None),
            ValueKind::Int64 => TypedValue::Int64(None),
            ValueKind::UInt64 => TypedValue::UInt64(None),
            ValueKind::String => TypedValue::String(None),
            ValueKind::Time => TypedValue::Time(None),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Float64(_) => ValueKind::Float64,
            TypedValue::Int64(_) => ValueKind::Int64,
            TypedValue::UInt64(_) => ValueKind::UInt64,
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Time(_) => ValueKind::Time,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            TypedValue::Float64(v) => v.is_none(),
            TypedValue::Int64(v) => v.is_none(),
            TypedValue::UInt64(v) => v.is_none(),
            TypedValue::String(v) => v.is_none(),
            TypedValue::Time(v) => v.is_none(),
        }
    }

    /// The timestamp, if this is a non-null time value.
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            TypedValue::Time(t) => *t,
            _ => None,
        }
    }
}

/// Human-readable form used for series names and label values.
/// Nulls render as `null`.
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Float64(Some(v)) => write!(f, "{v}"),
            TypedValue::Int64(Some(v)) => write!(f, "{v}"),
            TypedValue::UInt64(Some(v)) => write!(f, "{v}"),
            TypedValue::String(Some(v)) => f.write_str(v),
            TypedValue::Time(Some(v)) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            _ => f.write_str("null"),
        }
    }
}
