//! Decoder for SvelteKit `__data.json` documents.
//!
//! Those documents deduplicate every value into one flat pool. Objects and
//! arrays inside the pool hold indices into the same pool instead of values:
//!
//! ```text
//! nodes[2].data = [ {"financialData": 1}, {"revenue": 2}, [3, 4], 100, 200 ]
//!                   ^ entry point         ^ glossary      ^ list  ^ values
//! ```
//!
//! Resolving `revenue` goes glossary -> index list -> values and yields
//! `[100, 200]`.

use std::sync::LazyLock;

use serde_json::{json, Map, Value};

use super::is_empty_value;
use super::labels::LabelTable;
use super::IndexedRows;
use crate::envelope::{DecodedRecord, Payload};
use crate::DecodeError;

/// Position of the node carrying the page payload.
pub const TARGET_NODE: usize = 2;

/// Key whose presence marks a redacted row.
const LIMITED_MARKER: &str = "limited";

/// Negative indices the encoder uses for `undefined`, holes, `NaN`,
/// `Infinity` and `-Infinity`. JSON has no value for them.
const NULL_SENTINELS: std::ops::RangeInclusive<i64> = -5..=-1;

/// Negative index the encoder uses for `-0`.
const NEGATIVE_ZERO_SENTINEL: i64 = -6;

static NULL: Value = Value::Null;
static NEGATIVE_ZERO: LazyLock<Value> = LazyLock::new(|| json!(-0.0));

pub(super) fn decode(
    document: Value,
    glossary_key: &str,
    rows: IndexedRows,
    table: &LabelTable,
) -> Result<Payload, DecodeError> {
    if is_empty_value(&document) {
        return Ok(Payload::Empty(document));
    }

    let pool = ValuePool::from_document(&document)?;
    let glossary = pool.glossary(glossary_key)?;

    let mut resolved = DecodedRecord::new();
    for (field, list_index) in glossary {
        let list_index = as_index(list_index, field)?;
        let indices = pool
            .resolve(list_index)?
            .as_array()
            .ok_or_else(|| DecodeError::ExpectedIndexList {
                field: field.clone(),
            })?;

        let mut values = Vec::with_capacity(indices.len());
        for index in indices {
            let value = pool.resolve(as_index(index, field)?)?;
            match rows {
                IndexedRows::Scalar => values.push(value.clone()),
                IndexedRows::Records => {
                    if let Some(record) = pool.resolve_record(value, field)? {
                        values.push(Value::Object(record));
                    }
                }
            }
        }

        resolved.insert(field.clone(), Value::Array(values));
    }

    Ok(Payload::Rows(vec![table.relabel(resolved)]))
}

struct ValuePool<'a> {
    values: &'a [Value],
}

impl<'a> ValuePool<'a> {
    fn from_document(document: &'a Value) -> Result<Self, DecodeError> {
        let nodes = document
            .get("nodes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let node = nodes
            .get(TARGET_NODE)
            .ok_or(DecodeError::MissingTargetNode { found: nodes.len() })?;

        let values = node
            .get("data")
            .and_then(Value::as_array)
            .filter(|values| !values.is_empty())
            .ok_or(DecodeError::MissingNodeData)?;

        Ok(Self { values })
    }

    /// Looks up the glossary through the entry point at `data[0]`.
    fn glossary(&self, key: &str) -> Result<&'a Map<String, Value>, DecodeError> {
        let missing = || DecodeError::MissingGlossaryIndex {
            key: key.to_owned(),
        };

        let index = self.values[0]
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(missing)?;
        let index = usize::try_from(index).map_err(|_| missing())?;

        self.get(index)?
            .as_object()
            .filter(|glossary| !glossary.is_empty())
            .ok_or(DecodeError::InvalidGlossary { index })
    }

    fn get(&self, index: usize) -> Result<&'a Value, DecodeError> {
        self.values
            .get(index)
            .ok_or(DecodeError::IndexOutOfBounds {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len: self.values.len(),
            })
    }

    fn resolve(&self, index: i64) -> Result<&'a Value, DecodeError> {
        if NULL_SENTINELS.contains(&index) {
            return Ok(&NULL);
        }
        if index == NEGATIVE_ZERO_SENTINEL {
            return Ok(&NEGATIVE_ZERO);
        }

        usize::try_from(index)
            .ok()
            .and_then(|position| self.values.get(position))
            .ok_or(DecodeError::IndexOutOfBounds {
                index,
                len: self.values.len(),
            })
    }

    /// Resolves an index-encoded record. `None` when the record is marked
    /// as limited.
    fn resolve_record(
        &self,
        value: &Value,
        field: &str,
    ) -> Result<Option<DecodedRecord>, DecodeError> {
        let encoded = value.as_object().ok_or_else(|| DecodeError::ExpectedRecord {
            field: field.to_owned(),
        })?;

        if encoded.contains_key(LIMITED_MARKER) {
            return Ok(None);
        }

        let mut record = DecodedRecord::new();
        for (key, index) in encoded {
            let resolved = self.resolve(as_index(index, field)?)?;
            record.insert(key.clone(), resolved.clone());
        }
        Ok(Some(record))
    }
}

fn as_index(value: &Value, field: &str) -> Result<i64, DecodeError> {
    value.as_i64().ok_or_else(|| DecodeError::ExpectedIndex {
        field: field.to_owned(),
    })
}
