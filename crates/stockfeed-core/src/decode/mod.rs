//! Payload decoding.
//!
//! Every fetcher owns exactly one [`DecodeStrategy`], fixed at compile time:
//!
//! | Strategy | Upstream shape | Output |
//! |---|---|---|
//! | `Flat` | record or list of records at a JSON path | same records, keys relabelled |
//! | `Indexed` | SvelteKit node document with a shared value pool | one row of resolved series per field |
//! | `PricePairs` | list of `[timestamp_ms, price]` | one `{date, closing_price}` row per pair |
//!
//! Empty upstream values (`null`, `false`, `""`, `[]`, `{}`) decode to
//! [`Payload::Empty`] rather than an error.

mod flat;
mod indexed;
pub mod labels;
mod series;

use serde_json::Value;

use crate::envelope::Payload;
use crate::policy::CalendarOffset;
use crate::DecodeError;

pub use labels::LabelTable;

/// Shape of the rows behind an indexed glossary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexedRows {
    /// Each resolved entry is a scalar value.
    Scalar,
    /// Each resolved entry is itself an index-encoded record; rows carrying a
    /// `limited` key are dropped.
    Records,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeStrategy {
    Flat {
        path: &'static [&'static str],
        table: &'static LabelTable,
    },
    Indexed {
        glossary_key: &'static str,
        rows: IndexedRows,
        table: &'static LabelTable,
    },
    PricePairs {
        path: &'static [&'static str],
        offset: CalendarOffset,
    },
}

impl DecodeStrategy {
    pub fn decode(&self, document: Value) -> Result<Payload, DecodeError> {
        match *self {
            Self::Flat { path, table } => flat::decode(document, path, table),
            Self::Indexed {
                glossary_key,
                rows,
                table,
            } => indexed::decode(document, glossary_key, rows, table),
            Self::PricePairs { path, offset } => series::decode(document, path, offset.resolve()),
        }
    }
}

/// `true` for the values upstream uses to mean "nothing here".
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Walks `path` through nested objects. Stops early with `Ok(Err(empty))`
/// when an empty value is met on the way.
fn walk_path(document: Value, path: &[&str]) -> Result<Result<Value, Value>, DecodeError> {
    let mut current = document;
    for (depth, key) in path.iter().enumerate() {
        if is_empty_value(&current) {
            return Ok(Err(current));
        }
        current = match current {
            Value::Object(mut map) => map.remove(*key).unwrap_or(Value::Null),
            _ => {
                return Err(DecodeError::UnexpectedShape {
                    expected: "an object",
                    path: path_label(&path[..depth]),
                })
            }
        };
    }

    if is_empty_value(&current) {
        Ok(Err(current))
    } else {
        Ok(Ok(current))
    }
}

fn path_label(path: &[&str]) -> String {
    if path.is_empty() {
        String::from("$")
    } else {
        path.join(".")
    }
}
