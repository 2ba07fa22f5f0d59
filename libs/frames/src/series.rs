//! Time-series assembly: one frame per series, each a (time, value) pair.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::classify::{Classification, ColumnMeta};
use crate::error::Error;
use crate::frame::{Frame, FrameSet};
use crate::parser::ValueParser;
use crate::response::Row;
use crate::types::{tuple_series_types, value_kind};
use crate::value::TypedValue;

pub(crate) struct SeriesAssembler<'a> {
    meta: &'a [ColumnMeta],
    classes: &'a Classification,
    time_index: usize,
    frames: FrameSet,
}

impl<'a> SeriesAssembler<'a> {
    pub fn new(
        ref_id: &str,
        meta: &'a [ColumnMeta],
        classes: &'a Classification,
        time_index: usize,
    ) -> Self {
        Self {
            meta,
            classes,
            time_index,
            frames: FrameSet::new(ref_id),
        }
    }

    pub fn push_row(&mut self, row: &Row, parser: &mut ValueParser) -> Result<(), Error> {
        let time_column = &self.meta[self.time_index];
        let raw = row.get(&time_column.name).unwrap_or(&Value::Null);
        let time = parser
            .parse_time_index(&time_column.r#type, raw)
            .as_time()
            .ok_or_else(|| Error::InvalidTimestamp {
                column: time_column.name.clone(),
                value: raw.to_string(),
            })?;

        if self.classes.has_labels() {
            self.push_labeled(row, time, parser);
            Ok(())
        } else {
            self.push_unlabeled(row, time, parser)
        }
    }

    pub fn finish(self) -> Vec<Frame> {
        self.frames.into_frames()
    }

    /// Rows with label columns: the joined label values name the series.
    fn push_labeled(&mut self, row: &Row, time: DateTime<Utc>, parser: &mut ValueParser) {
        let meta = self.meta;
        let classes = self.classes;

        let mut parts = Vec::with_capacity(classes.sorted_labels.len());
        let mut labels = BTreeMap::new();
        for name in &classes.sorted_labels {
            let Some(raw) = row.get(name) else {
                continue;
            };
            let column = &meta[classes.label_columns[name]];
            let value = parser.parse(&column.r#type, raw).to_string();
            labels.insert(name.clone(), value.clone());
            parts.push(value);
        }
        let prefix = parts.join(", ");

        let time_name = &meta[self.time_index].name;
        for (i, column) in meta.iter().enumerate() {
            if i == self.time_index || classes.is_label(&column.name) {
                continue;
            }
            let Some(raw) = row.get(&column.name) else {
                continue;
            };
            let name = if classes.has_multiple_series {
                format!("{prefix}, {}", column.name)
            } else {
                prefix.clone()
            };
            let value = parser.parse(&column.r#type, raw);
            let frame = self
                .frames
                .series(&name, time_name, value_kind(&column.r#type));
            frame.labels.clone_from(&labels);
            append(frame, &column.name, time, value);
        }
    }

    /// Rows without label columns: one series per column, or one per tuple
    /// label for `Array(Tuple(L, V))` columns.
    fn push_unlabeled(
        &mut self,
        row: &Row,
        time: DateTime<Utc>,
        parser: &mut ValueParser,
    ) -> Result<(), Error> {
        let meta = self.meta;
        let time_name = &meta[self.time_index].name;
        for (i, column) in meta.iter().enumerate() {
            if i == self.time_index {
                continue;
            }
            let Some(raw) = row.get(&column.name) else {
                continue;
            };
            match tuple_series_types(&column.r#type) {
                Some((label_type, value_type)) => {
                    self.fan_out(column, label_type, value_type, raw, time, parser)?;
                }
                None => {
                    let value = parser.parse(&column.r#type, raw);
                    let frame =
                        self.frames
                            .series(&column.name, time_name, value_kind(&column.r#type));
                    append(frame, &column.name, time, value);
                }
            }
        }
        Ok(())
    }

    fn fan_out(
        &mut self,
        column: &ColumnMeta,
        label_type: &str,
        value_type: &str,
        raw: &Value,
        time: DateTime<Utc>,
        parser: &mut ValueParser,
    ) -> Result<(), Error> {
        let malformed = || Error::MalformedTuple {
            column: column.name.clone(),
            value: raw.to_string(),
        };
        let tuples = match raw {
            Value::Array(tuples) => tuples,
            Value::Null => return Ok(()),
            _ => return Err(malformed()),
        };

        let meta = self.meta;
        let time_name = &meta[self.time_index].name;
        let kind = value_kind(value_type);
        for tuple in tuples {
            let [label, value] = tuple.as_array().map(Vec::as_slice).unwrap_or_default() else {
                return Err(malformed());
            };
            let label = match parser.parse(label_type, label).to_string() {
                label if label.is_empty() => String::from("null"),
                label => label,
            };
            let value = parser.parse(value_type, value);
            let frame = self.frames.series(&label, time_name, kind);
            append(frame, &column.name, time, value);
        }
        Ok(())
    }
}

fn append(frame: &mut Frame, column: &str, time: DateTime<Utc>, value: TypedValue) {
    let kind = value.kind();
    if !frame.push_point(time, value) {
        tracing::warn!(
            series = %frame.name,
            column,
            %kind,
            "value does not match the series field type, stored as null"
        );
    }
}
