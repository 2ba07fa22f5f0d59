//! Columnar output: named frames of typed, nullable fields.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::value::{TypedValue, ValueKind};

/// Values of one field. Every entry is optional; `None` is a typed null.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValues {
    Float64(Vec<Option<f64>>),
    Int64(Vec<Option<i64>>),
    UInt64(Vec<Option<u64>>),
    String(Vec<Option<String>>),
    Time(Vec<Option<DateTime<Utc>>>),
}

impl FieldValues {
    pub fn with_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Float64 => FieldValues::Float64(Vec::new()),
            ValueKind::Int64 => FieldValues::Int64(Vec::new()),
            ValueKind::UInt64 => FieldValues::UInt64(Vec::new()),
            ValueKind::String => FieldValues::String(Vec::new()),
            ValueKind::Time => FieldValues::Time(Vec::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValues::Float64(_) => ValueKind::Float64,
            FieldValues::Int64(_) => ValueKind::Int64,
            FieldValues::UInt64(_) => ValueKind::UInt64,
            FieldValues::String(_) => ValueKind::String,
            FieldValues::Time(_) => ValueKind::Time,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValues::Float64(v) => v.len(),
            FieldValues::Int64(v) => v.len(),
            FieldValues::UInt64(v) => v.len(),
            FieldValues::String(v) => v.len(),
            FieldValues::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value. A value of another kind is stored as a null of this
    /// field's kind and `false` is returned.
    pub fn push(&mut self, value: TypedValue) -> bool {
        match (self, value) {
            (FieldValues::Float64(v), TypedValue::Float64(x)) => v.push(x),
            (FieldValues::Int64(v), TypedValue::Int64(x)) => v.push(x),
            (FieldValues::UInt64(v), TypedValue::UInt64(x)) => v.push(x),
            (FieldValues::String(v), TypedValue::String(x)) => v.push(x),
            (FieldValues::Time(v), TypedValue::Time(x)) => v.push(x),
            (values, _) => {
                values.push_null();
                return false;
            }
        }
        true
    }

    fn push_null(&mut self) {
        match self {
            FieldValues::Float64(v) => v.push(None),
            FieldValues::Int64(v) => v.push(None),
            FieldValues::UInt64(v) => v.push(None),
            FieldValues::String(v) => v.push(None),
            FieldValues::Time(v) => v.push(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub values: FieldValues,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::with_kind(kind),
        }
    }
}

/// One series or one table column.
///
/// A time-series frame has exactly two fields: the time field, then the
/// value field. A table frame has a single field.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub name: String,
    /// Reference id of the query that produced this frame.
    pub ref_id: String,
    pub labels: BTreeMap<String, String>,
    pub fields: Vec<Field>,
}

impl Frame {
    pub fn new(name: impl Into<String>, ref_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ref_id: ref_id.into(),
            labels: BTreeMap::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of rows, taken from the first field.
    pub fn len(&self) -> usize {
        self.fields.first().map_or(0, |f| f.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a (time, value) pair to a two-field time-series frame.
    /// Returns `false` if the value had to be stored as a null.
    pub(crate) fn push_point(&mut self, time: DateTime<Utc>, value: TypedValue) -> bool {
        match self.fields.as_mut_slice() {
            [time_field, value_field] => {
                time_field.values.push(TypedValue::Time(Some(time)));
                value_field.values.push(value)
            }
            _ => false,
        }
    }
}

/// Frames created on first use, kept in creation order.
#[derive(Debug)]
pub(crate) struct FrameSet {
    ref_id: String,
    frames: Vec<Frame>,
    by_name: HashMap<String, usize>,
}

impl FrameSet {
    pub fn new(ref_id: &str) -> Self {
        Self {
            ref_id: ref_id.to_string(),
            frames: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// The time-series frame called `name`, created with a `time_field` and
    /// a value field of `kind` if it does not exist yet.
    pub fn series(&mut self, name: &str, time_field: &str, kind: ValueKind) -> &mut Frame {
        let index = match self.by_name.get(name).copied() {
            Some(index) => index,
            None => {
                let frame = Frame::new(name, self.ref_id.as_str())
                    .with_field(Field::new(time_field, ValueKind::Time))
                    .with_field(Field::new(name, kind));
                self.frames.push(frame);
                self.by_name.insert(name.to_string(), self.frames.len() - 1);
                self.frames.len() - 1
            }
        };
        &mut self.frames[index]
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}
