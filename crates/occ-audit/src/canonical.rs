//! Canonical JSON: object keys in byte order at every depth, no whitespace.
//!
//! Scalars are written by `serde_json`, so numbers and string escapes match
//! its compact output.

use occ_core::errors::{ErrorInfo, OccError};
use serde::Serialize;
use serde_json::Value;

fn encode_error(code: &str, err: serde_json::Error) -> OccError {
    OccError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), OccError> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (idx, (key, item)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key).map_err(|err| encode_error("canonical-key", err))?;
                out.push(b':');
                write_value(item, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        scalar => serde_json::to_writer(&mut *out, scalar).map_err(|err| encode_error("canonical-scalar", err))?,
    }
    Ok(())
}

/// Canonical JSON bytes of `value`.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, OccError> {
    let value = serde_json::to_value(value).map_err(|err| encode_error("canonical-encode", err))?;
    let mut out = Vec::new();
    write_value(&value, &mut out)?;
    Ok(out)
}
