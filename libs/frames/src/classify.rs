//! Column roles: which columns name series and which one indexes time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types;

/// A column as declared in the `meta` section of a response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
        }
    }

    fn is_time_index(&self) -> bool {
        self.r#type.starts_with("DateTime") || (self.name == "t" && self.r#type.contains("Int"))
    }
}

/// Roles of the columns of one response, computed once before the rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// Label-eligible columns, by name, with their declaration index.
    pub label_columns: HashMap<String, usize>,
    /// Label column names in alphabetical order, the order their values
    /// are joined into series names.
    pub sorted_labels: Vec<String>,
    /// First column usable as the time index.
    pub timestamp_column: Option<usize>,
    /// More than one value column remains besides time and labels, so
    /// series names need the column name appended.
    pub has_multiple_series: bool,
}

impl Classification {
    pub fn is_label(&self, name: &str) -> bool {
        self.label_columns.contains_key(name)
    }

    pub fn has_labels(&self) -> bool {
        !self.label_columns.is_empty()
    }
}

pub fn classify(meta: &[ColumnMeta]) -> Classification {
    let label_columns: HashMap<String, usize> = meta
        .iter()
        .enumerate()
        .filter(|(_, column)| types::is_label_type(&column.r#type))
        .map(|(i, column)| (column.name.clone(), i))
        .collect();

    let mut sorted_labels: Vec<String> = label_columns.keys().cloned().collect();
    sorted_labels.sort();

    let timestamp_column = meta.iter().position(ColumnMeta::is_time_index);
    let has_multiple_series = meta.len().saturating_sub(label_columns.len()) > 2;

    Classification {
        label_columns,
        sorted_labels,
        timestamp_column,
        has_multiple_series,
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnMeta, classify};

    fn meta(columns: &[(&str, &str)]) -> Vec<ColumnMeta> {
        columns
            .iter()
            .map(|(name, ty)| ColumnMeta::new(*name, *ty))
            .collect()
    }

    #[test]
    fn finds_labels_and_time_index() {
        let meta = meta(&[
            ("t", "DateTime"),
            ("region", "LowCardinality(String)"),
            ("host", "String"),
            ("tags", "Array(String)"),
            ("value", "Float64"),
        ]);
        let classes = classify(&meta);
        assert_eq!(classes.timestamp_column, Some(0));
        assert_eq!(classes.sorted_labels, vec!["host", "region"]);
        assert_eq!(classes.label_columns["region"], 1);
        assert_eq!(classes.label_columns["host"], 2);
        assert!(!classes.is_label("tags"));
        assert!(classes.has_multiple_series, "tags and value are both value columns");
    }

    #[test]
    fn only_the_first_time_column_counts() {
        let meta = meta(&[
            ("value", "Float64"),
            ("created", "DateTime64(3)"),
            ("updated", "DateTime"),
        ]);
        assert_eq!(classify(&meta).timestamp_column, Some(1));
    }

    #[test]
    fn legacy_integer_t_column() {
        assert_eq!(
            classify(&meta(&[("t", "UInt64"), ("c", "UInt64")])).timestamp_column,
            Some(0)
        );
        assert_eq!(
            classify(&meta(&[("ts", "UInt64"), ("c", "UInt64")])).timestamp_column,
            None
        );
        assert_eq!(
            classify(&meta(&[("t", "String"), ("c", "UInt64")])).timestamp_column,
            None
        );
    }

    #[test]
    fn date_columns_are_not_time_indexes() {
        assert_eq!(
            classify(&meta(&[("d", "Date"), ("c", "UInt64")])).timestamp_column,
            None
        );
    }

    #[test]
    fn single_value_column_is_not_multiple() {
        let meta = meta(&[("t", "DateTime"), ("host", "String"), ("value", "Float64")]);
        let classes = classify(&meta);
        assert!(classes.has_labels());
        assert!(!classes.has_multiple_series);
    }
}
