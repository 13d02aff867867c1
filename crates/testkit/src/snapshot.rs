//! Canonical JSON and state hashing for determinism checks.
//!
//! Values are serialized with object keys sorted so two structurally equal
//! states always produce the same bytes, whatever map type they came from.
//! The hash is a CRC32 over those bytes; it is a fingerprint for comparing
//! runs, not a security primitive.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Serialize `value` as pretty JSON with sorted object keys and a trailing newline.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let value = canonicalize_value(value);
    let mut s = serde_json::to_string_pretty(&value).context("Failed to format snapshot JSON")?;
    s.push('\n');
    Ok(s)
}

/// Fingerprint of `value`'s canonical JSON, as eight hex digits.
pub fn state_hash<T: Serialize>(value: &T) -> Result<String> {
    let json = canonical_json(value)?;
    Ok(format!("{:08x}", crc32fast::hash(json.as_bytes())))
}

fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                out.insert(k, canonicalize_value(v));
            }
            Value::Object(out)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}
