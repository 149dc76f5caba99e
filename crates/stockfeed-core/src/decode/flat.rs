use serde_json::Value;

use super::labels::LabelTable;
use super::{path_label, walk_path};
use crate::envelope::Payload;
use crate::DecodeError;

pub(super) fn decode(
    document: Value,
    path: &[&str],
    table: &LabelTable,
) -> Result<Payload, DecodeError> {
    let value = match walk_path(document, path)? {
        Ok(value) => value,
        Err(empty) => return Ok(Payload::Empty(empty)),
    };

    match value {
        Value::Object(record) => Ok(Payload::Record(table.relabel(record))),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(table.relabel(record)),
                _ => Err(DecodeError::UnexpectedShape {
                    expected: "a list of records",
                    path: path_label(path),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Payload::Rows),
        _ => Err(DecodeError::UnexpectedShape {
            expected: "a record or a list of records",
            path: path_label(path),
        }),
    }
}
