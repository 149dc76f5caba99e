use serde_json::{json, Value};
use time::{OffsetDateTime, UtcOffset};

use super::{path_label, walk_path};
use crate::envelope::{DecodedRecord, Payload};
use crate::DecodeError;

pub(super) fn decode(
    document: Value,
    path: &[&str],
    offset: UtcOffset,
) -> Result<Payload, DecodeError> {
    let value = match walk_path(document, path)? {
        Ok(value) => value,
        Err(empty) => return Ok(Payload::Empty(empty)),
    };

    let Value::Array(entries) = value else {
        return Err(DecodeError::UnexpectedShape {
            expected: "a list of [timestamp_ms, price] pairs",
            path: path_label(path),
        });
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_pair(index, entry, offset))
        .collect::<Result<Vec<_>, _>>()
        .map(Payload::Rows)
}

fn decode_pair(index: usize, entry: &Value, offset: UtcOffset) -> Result<DecodedRecord, DecodeError> {
    let malformed = || DecodeError::MalformedSeriesEntry { index };

    let pair = entry.as_array().filter(|pair| pair.len() == 2).ok_or_else(malformed)?;
    let millis = pair[0].as_f64().ok_or_else(malformed)?;
    let price = match &pair[1] {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(malformed)?;

    let mut record = DecodedRecord::new();
    record.insert(String::from("date"), Value::String(calendar_date(millis, offset)?));
    record.insert(String::from("closing_price"), json!(price));
    Ok(record)
}

/// `YYYY-MM-DD` of a millisecond timestamp, rounded to the nearest second.
pub(crate) fn calendar_date(millis: f64, offset: UtcOffset) -> Result<String, DecodeError> {
    let seconds = (millis / 1000.0).round();
    let invalid = || DecodeError::InvalidTimestamp {
        value: millis as i64,
    };

    if !seconds.is_finite() {
        return Err(invalid());
    }

    let date = OffsetDateTime::from_unix_timestamp(seconds as i64)
        .ok()
        .filter(|at| (1..=9998).contains(&at.year()))
        .ok_or_else(invalid)?
        .to_offset(offset)
        .date();

    Ok(format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    ))
}
