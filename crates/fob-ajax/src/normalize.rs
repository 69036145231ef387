//! Normalization of values read back from the observed context.
//!
//! Header blocks and bodies arrive as plain text. Sequences sometimes arrive
//! as objects keyed by index (`{"0": a, "1": b}`) because some drivers encode
//! arrays that way; [`reconstruct_sequence`] undoes that so nothing above the
//! retrieval layer has to care.

use crate::error::Result;
use crate::record::{RawRecord, RequestRecord};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parses a raw header block into a map keyed by lower-cased header name.
///
/// Lines are split on `\n` with `\r` removed. Each line is split at its first
/// colon; name and value are trimmed. Lines without a colon, or with an empty
/// name or value, are skipped. A repeated header keeps its last value.
#[must_use]
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .filter_map(|line| {
            let (name, value) = line.trim_end_matches('\r').split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty())
                .then(|| (name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

/// Parses a body as JSON, falling back to the raw text verbatim.
#[must_use]
pub fn parse_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Normalizes one raw record value.
///
/// `null` is an absent record and yields `Ok(None)`.
///
/// # Errors
///
/// Returns `MalformedRecord` if the value is not shaped like a record.
pub fn normalize_record(value: &Value) -> Result<Option<RequestRecord>> {
    if value.is_null() {
        return Ok(None);
    }
    let raw = RawRecord::deserialize(value)?;
    Ok(Some(raw.into()))
}

/// Coerces a sequence-valued result into an ordered list.
///
/// Arrays pass through. Objects whose keys are all non-negative integers are
/// rebuilt by iterating `0..=max_key`, with `Value::Null` for missing keys;
/// an empty object is an empty sequence. Anything else is not a sequence and
/// yields `None`.
#[must_use]
pub fn reconstruct_sequence(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            let mut max = None;
            for key in map.keys() {
                let index: usize = key.parse().ok()?;
                max = max.max(Some(index));
            }
            let Some(max) = max else {
                return Some(Vec::new());
            };
            Some(
                (0..=max)
                    .map(|i| map.remove(&i.to_string()).unwrap_or(Value::Null))
                    .collect(),
            )
        }
        _ => None,
    }
}
