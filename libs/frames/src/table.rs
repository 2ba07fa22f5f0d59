//! Table assembly: one single-field frame per column, rows in input order.

use serde_json::Value;

use crate::classify::ColumnMeta;
use crate::frame::{Field, Frame};
use crate::parser::ValueParser;
use crate::response::Row;
use crate::types::value_kind;

pub(crate) struct TableAssembler<'a> {
    meta: &'a [ColumnMeta],
    frames: Vec<Frame>,
}

impl<'a> TableAssembler<'a> {
    pub fn new(ref_id: &str, meta: &'a [ColumnMeta]) -> Self {
        let frames = meta
            .iter()
            .map(|column| {
                Frame::new(&column.name, ref_id)
                    .with_field(Field::new(&column.name, value_kind(&column.r#type)))
            })
            .collect();
        Self { meta, frames }
    }

    pub fn push_row(&mut self, row: &Row, parser: &mut ValueParser) {
        for (column, frame) in self.meta.iter().zip(&mut self.frames) {
            let raw = row.get(&column.name).unwrap_or(&Value::Null);
            let value = parser.parse(&column.r#type, raw);
            if let Some(field) = frame.fields.first_mut() {
                field.values.push(value);
            }
        }
    }

    pub fn finish(self) -> Vec<Frame> {
        self.frames
    }
}
