//! The ClickHouse type tag grammar, as far as frame building needs it.
//!
//! Type tags arrive as strings in the `meta` section of a `FORMAT JSON`
//! response, e.g. `Nullable(LowCardinality(String))` or
//! `Array(Tuple(String, Float64))`. Only the outer wrappers are unwrapped
//! structurally; everything else is classified by prefix or by one of the
//! precompiled patterns below.

use std::sync::LazyLock;

use chrono_tz::Tz;
use regex::Regex;

use crate::value::ValueKind;

/// Types that may hold several values per cell. Never label-eligible.
static COMPOUND_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Array|Tuple|Map").expect("valid compound type pattern"));

/// Textual or identifier types usable as series labels.
static LABEL_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"String|UUID|Enum|IPv4|IPv6").expect("valid label type pattern")
});

/// `Array(Tuple(<label>, <value>))`, captured as one inner group that is
/// split on its top-level comma afterwards.
static TUPLE_SERIES_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Array\(\s*Tuple\((.+)\)\s*\)$").expect("valid tuple series pattern")
});

/// A quoted timezone inside `DateTime('..')` or `DateTime64(3, '..')`.
static QUOTED_TIMEZONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)'").expect("valid timezone pattern"));

/// Strip any nesting of `Nullable(..)` and `LowCardinality(..)`, in either order.
pub fn unwrap_type(type_tag: &str) -> &str {
    let mut current = type_tag.trim();
    loop {
        let inner = current
            .strip_prefix("Nullable(")
            .or_else(|| current.strip_prefix("LowCardinality("))
            .and_then(|rest| rest.strip_suffix(')'));
        match inner {
            Some(inner) => current = inner.trim(),
            None => return current,
        }
    }
}

/// The value family a type tag decodes into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BaseType {
    /// Small integers, floats, decimals and booleans, all carried as `f64`.
    Numeric,
    UInt64,
    Int64,
    /// `String`, `UUID`, `FixedString(n)`, `Enum8/16(..)`, `IPv4`, `IPv6`.
    Text,
    /// `Date`, `Date32`.
    Date,
    /// `DateTime`, `DateTime64(..)`, optionally with the column's own zone.
    DateTime { tz: Option<Tz> },
    /// Anything not modeled above; decoded as a JSON string.
    Other,
}

impl BaseType {
    pub fn of(type_tag: &str) -> Self {
        let base = unwrap_type(type_tag);
        match base {
            "UInt64" => return BaseType::UInt64,
            "Int64" => return BaseType::Int64,
            "UInt8" | "UInt16" | "UInt32" | "Int8" | "Int16" | "Int32" | "Float32"
            | "Float64" | "Bool" => return BaseType::Numeric,
            "String" | "UUID" | "IPv4" | "IPv6" => return BaseType::Text,
            _ => {}
        }
        if base.starts_with("Decimal") {
            BaseType::Numeric
        } else if base.starts_with("FixedString") || base.starts_with("Enum") {
            BaseType::Text
        } else if base.starts_with("DateTime") {
            BaseType::DateTime {
                tz: column_timezone(base),
            }
        } else if base.starts_with("Date") {
            BaseType::Date
        } else {
            BaseType::Other
        }
    }

    /// Kind of the values the parser produces for this type.
    pub fn kind(&self) -> ValueKind {
        match self {
            BaseType::Numeric => ValueKind::Float64,
            BaseType::UInt64 => ValueKind::UInt64,
            BaseType::Int64 => ValueKind::Int64,
            BaseType::Text | BaseType::Other => ValueKind::String,
            BaseType::Date | BaseType::DateTime { .. } => ValueKind::Time,
        }
    }

    pub fn is_time(&self) -> bool {
        matches!(self, BaseType::Date | BaseType::DateTime { .. })
    }
}

/// Shorthand for `BaseType::of(type_tag).kind()`.
pub fn value_kind(type_tag: &str) -> ValueKind {
    BaseType::of(type_tag).kind()
}

/// True if values of this type need a timezone to be decoded.
pub fn is_time_type(type_tag: &str) -> bool {
    BaseType::of(type_tag).is_time()
}

pub fn is_compound_type(type_tag: &str) -> bool {
    COMPOUND_TYPE.is_match(type_tag)
}

/// Label columns hold simple textual values; compound types are excluded
/// even when they mention `String` somewhere inside.
pub fn is_label_type(type_tag: &str) -> bool {
    LABEL_TYPE.is_match(type_tag) && !is_compound_type(type_tag)
}

/// For `Array(Tuple(L, V))`, return `(L, V)`.
pub fn tuple_series_types(type_tag: &str) -> Option<(&str, &str)> {
    let inner = TUPLE_SERIES_TYPE.captures(type_tag.trim())?.get(1)?.as_str();
    let (label, value) = split_top_level(inner)?;
    let (label, value) = (label.trim(), value.trim());
    if label.is_empty() || value.is_empty() {
        return None;
    }
    Some((label, value))
}

/// Split `a, b` at the only comma that is outside parentheses and quotes.
/// More than two top-level elements is not a pair.
fn split_top_level(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut split_at = None;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.checked_sub(1)?,
            ',' if !quoted && depth == 0 => {
                if split_at.is_some() {
                    return None;
                }
                split_at = Some(i);
            }
            _ => {}
        }
    }
    let i = split_at?;
    Some((&s[..i], &s[i + 1..]))
}

fn column_timezone(base: &str) -> Option<Tz> {
    let name = QUOTED_TIMEZONE.captures(base)?.get(1)?.as_str();
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::{
        BaseType, is_compound_type, is_label_type, split_top_level, tuple_series_types,
        unwrap_type, value_kind,
    };
    use crate::value::ValueKind;

    #[test]
    fn unwraps_nested_wrappers_in_any_order() {
        for (tag, base) in [
            ("String", "String"),
            ("Nullable(String)", "String"),
            ("LowCardinality(String)", "String"),
            ("Nullable(LowCardinality(String))", "String"),
            ("LowCardinality(Nullable(String))", "String"),
            ("Nullable(Array(UInt8))", "Array(UInt8)"),
            ("Nullable(", "Nullable("),
        ] {
            assert_eq!(unwrap_type(tag), base, "Failed to unwrap '{tag}'");
        }
    }

    #[test]
    fn base_types() {
        for (tag, expected) in [
            ("UInt8", BaseType::Numeric),
            ("UInt16", BaseType::Numeric),
            ("UInt32", BaseType::Numeric),
            ("Int8", BaseType::Numeric),
            ("Int16", BaseType::Numeric),
            ("Int32", BaseType::Numeric),
            ("Float32", BaseType::Numeric),
            ("Float64", BaseType::Numeric),
            ("Decimal(9, 2)", BaseType::Numeric),
            ("Decimal64(4)", BaseType::Numeric),
            ("UInt64", BaseType::UInt64),
            ("Int64", BaseType::Int64),
            ("Nullable(Int64)", BaseType::Int64),
            ("String", BaseType::Text),
            ("UUID", BaseType::Text),
            ("IPv4", BaseType::Text),
            ("FixedString(16)", BaseType::Text),
            ("Enum8('a' = 1, 'b' = 2)", BaseType::Text),
            ("LowCardinality(Nullable(String))", BaseType::Text),
            ("Date", BaseType::Date),
            ("Date32", BaseType::Date),
            ("DateTime", BaseType::DateTime { tz: None }),
            ("DateTime64(3)", BaseType::DateTime { tz: None }),
            (
                "DateTime('Europe/Moscow')",
                BaseType::DateTime {
                    tz: Some(Tz::Europe__Moscow),
                },
            ),
            ("DateTime64(6, 'UTC')", BaseType::DateTime { tz: Some(Tz::UTC) }),
            ("DateTime('Not/AZone')", BaseType::DateTime { tz: None }),
            ("Array(String)", BaseType::Other),
            ("Map(String, UInt64)", BaseType::Other),
            ("UInt128", BaseType::Other),
        ] {
            assert_eq!(BaseType::of(tag), expected, "Wrong base type for '{tag}'");
        }
    }

    #[test]
    fn kinds() {
        assert_eq!(value_kind("Nullable(Float64)"), ValueKind::Float64);
        assert_eq!(value_kind("UInt64"), ValueKind::UInt64);
        assert_eq!(value_kind("Int64"), ValueKind::Int64);
        assert_eq!(value_kind("Enum16('x' = 1)"), ValueKind::String);
        assert_eq!(value_kind("DateTime64(3)"), ValueKind::Time);
        assert_eq!(value_kind("Tuple(String, UInt8)"), ValueKind::String);
    }

    #[test]
    fn label_types_exclude_compounds() {
        for tag in [
            "String",
            "LowCardinality(String)",
            "Nullable(String)",
            "FixedString(3)",
            "UUID",
            "Enum8('a' = 1)",
            "IPv6",
        ] {
            assert!(is_label_type(tag), "'{tag}' should be label-eligible");
        }
        for tag in [
            "Array(String)",
            "Map(String, String)",
            "Tuple(String, UInt8)",
            "UInt32",
            "DateTime",
        ] {
            assert!(!is_label_type(tag), "'{tag}' should not be label-eligible");
        }
        assert!(is_compound_type("Array(Tuple(String, Float64))"));
        assert!(!is_compound_type("Float64"));
    }

    #[test]
    fn tuple_series_pairs() {
        for (tag, expected) in [
            ("Array(Tuple(String, Float64))", Some(("String", "Float64"))),
            (
                "Array(Tuple(LowCardinality(String), Nullable(UInt64)))",
                Some(("LowCardinality(String)", "Nullable(UInt64)")),
            ),
            (
                "Array(Tuple(Enum8('a' = 1, 'b' = 2), Decimal(9, 2)))",
                Some(("Enum8('a' = 1, 'b' = 2)", "Decimal(9, 2)")),
            ),
            ("Array(Tuple(String, UInt8, UInt8))", None),
            ("Array(String)", None),
            ("Tuple(String, Float64)", None),
            ("Array(Tuple(String))", None),
        ] {
            assert_eq!(tuple_series_types(tag), expected, "Wrong pair for '{tag}'");
        }
    }

    #[test]
    fn split_rejects_unbalanced_parens() {
        assert_eq!(split_top_level("a), b"), None);
        assert_eq!(split_top_level("a, b"), Some(("a", " b")));
    }
}
