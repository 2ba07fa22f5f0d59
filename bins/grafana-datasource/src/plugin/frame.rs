use clickhouse_frames::{FieldValues, Frame as SeriesFrame};
use grafana_plugin_sdk::data::Frame;
use grafana_plugin_sdk::prelude::*;

// ═══════════════════════════════════════════════════════════════
//  Frame conversion: clickhouse-frames → Grafana data frames
// ═══════════════════════════════════════════════════════════════

/// Convert one frame. Labels go on every value field, not on the time field.
pub(crate) fn to_grafana_frame(frame: SeriesFrame) -> Frame {
    let SeriesFrame {
        name,
        labels,
        fields,
        ..
    } = frame;

    let mut out = Frame::new(name);
    for field in fields {
        let is_time = matches!(field.values, FieldValues::Time(_));
        let mut converted = match field.values {
            FieldValues::Float64(values) => values.into_opt_field(field.name),
            FieldValues::Int64(values) => values.into_opt_field(field.name),
            FieldValues::UInt64(values) => values.into_opt_field(field.name),
            FieldValues::String(values) => values.into_opt_field(field.name),
            FieldValues::Time(values) => values.into_opt_field(field.name),
        };
        if !is_time {
            converted.labels = labels.clone();
        }
        out = out.with_field(converted);
    }
    out
}
