//! # Records
//!
//! Entity records as the API returns them: schema-agnostic JSON objects.
//!
//! ## Merge Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Right-Biased Shallow Merge                          │
//! │                                                                         │
//! │  base   { id: "dev-1", name: "A", battery: 70 }                        │
//! │  patch  { id: "dev-1",            battery: 80, rssi: -90 }             │
//! │  ─────────────────────────────────────────────────────────────          │
//! │  result { id: "dev-1", name: "A", battery: 80, rssi: -90 }             │
//! │                                                                         │
//! │  • Fields in patch always win                                          │
//! │  • Fields absent from patch are preserved (never nulled)               │
//! │  • Only the top level is merged: nested objects are replaced whole     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An explicit `null` in the patch is a value like any other and overwrites.

use serde_json::{Map, Value};

/// A single entity record (device, gateway, ...).
///
/// `serde_json::Map` keeps its keys ordered, so merged records serialize
/// deterministically.
pub type Record = Map<String, Value>;

/// Merges `patch` over `base`, returning the new record.
///
/// A missing `base` behaves as the empty record.
pub fn merge_record(base: Option<&Record>, patch: &Record) -> Record {
    let mut merged = base.cloned().unwrap_or_default();
    merge_into(&mut merged, patch);
    merged
}

/// Merges `patch` over `target` in place.
pub fn merge_into(target: &mut Record, patch: &Record) {
    for (field, value) in patch {
        target.insert(field.clone(), value.clone());
    }
}

/// Converts a JSON value into a record if it is an object.
pub fn into_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
