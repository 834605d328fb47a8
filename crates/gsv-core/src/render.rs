//! # Deterministic JSON Rendering
//!
//! Diagnostic messages embed JSON payloads (the failing object, the
//! structured error list, the unresolved relationship). Those messages are
//! compared verbatim by test suites, so the rendering must not depend on
//! insertion order or on whether `serde_json` was built with
//! `preserve_order`.
//!
//! ## Rules
//!
//! 1. Object keys are emitted in lexicographic order at every depth.
//! 2. Arrays keep their element order.
//! 3. Output is pretty-printed with two-space indentation.
//!
//! Structs rendered through [`pretty_struct`] keep their declared field
//! order at the top level; nested `Value` maps are sorted.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::GsvError;

/// Return a copy of `value` with every object's keys in sorted order.
pub fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Pretty-print a JSON value with sorted keys and two-space indentation.
pub fn pretty(value: &Value) -> String {
    let ordered = sorted(value);
    // Serializing an in-memory `Value` has no failure path; the compact form
    // is only reachable if that ever changes.
    serde_json::to_string_pretty(&ordered).unwrap_or_else(|_| ordered.to_string())
}

/// Pretty-print any serializable value, keeping struct field order.
///
/// # Errors
///
/// Returns `GsvError::Serialization` if `item` cannot be serialized.
pub fn pretty_struct<T: Serialize + ?Sized>(item: &T) -> Result<String, GsvError> {
    Ok(serde_json::to_string_pretty(item)?)
}
