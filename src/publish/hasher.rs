use crate::error::Result;
use crate::publish::PublishPayload;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute SHA-256 of bytes as a lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Serialize to JSON with object keys sorted and no whitespace
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&sort_keys(value))?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Content hash of a publish payload.
///
/// Consumers compare hashes across publish attempts to skip redundant
/// publishes. The payload is canonicalized on a copy, so callers may pass
/// payloads whose collections were assembled in any order.
pub fn hash(payload: &PublishPayload) -> Result<String> {
    let mut canonical = payload.clone();
    canonical.canonicalize();
    let json = canonical_json(&canonical)?;
    Ok(sha256_hex(json.as_bytes()))
}
