//! # Device Store Reducer
//!
//! Maintains the device cache: identifier → device record, plus the
//! currently selected device.
//!
//! ## Action Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Device Reducer                                       │
//! │                                                                         │
//! │  Action              Effect                         Entities touched?   │
//! │  ──────────────────  ─────────────────────────────  ─────────────────   │
//! │  SelectDevice        selected = device_id           no (shared Arc)     │
//! │  UpsertDevice        entities[key] = merge(old,new) one key             │
//! │  UpsertDeviceList    fold merge over a copy,        all keys in list,   │
//! │                      commit once                    atomically          │
//! │  anything else       return input Arc               no                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reducer is total: it never fails and never panics. Records whose key
//! cannot be derived are skipped with a warning.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::action::Action;
use crate::entity::{self, EntityState};
use crate::ids::IdSelector;
use crate::record::Record;

const ENTITY: &str = "device";

/// Applies one action to the device slice.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use console_core::{devices, Action, EntityState, FieldPath};
/// use serde_json::json;
///
/// let ids = FieldPath::parse("id").unwrap();
/// let empty = Arc::new(EntityState::new());
///
/// let record = json!({ "id": "dev-1", "name": "A" }).as_object().cloned().unwrap();
/// let state = devices::reduce(&empty, &Action::UpsertDevice(record), &ids);
///
/// assert_eq!(state.get("dev-1").unwrap()["name"], json!("A"));
/// ```
pub fn reduce(state: &Arc<EntityState>, action: &Action, ids: &dyn IdSelector) -> Arc<EntityState> {
    match action {
        Action::SelectDevice { device_id } => entity::select(state, device_id),
        Action::UpsertDevice(record) => entity::upsert(state, record, ids, ENTITY),
        Action::UpsertDeviceList { entities } => entity::upsert_all(state, entities, ids, ENTITY),
        _ => Arc::clone(state),
    }
}

/// The device slice as the presentational layer sees it.
///
/// ```json
/// { "entities": { "dev-1": { "id": "dev-1" } }, "selectedDeviceId": "dev-1" }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesView<'a> {
    pub entities: &'a BTreeMap<String, Record>,
    pub selected_device_id: Option<&'a str>,
}

impl<'a> From<&'a EntityState> for DevicesView<'a> {
    fn from(state: &'a EntityState) -> Self {
        DevicesView {
            entities: &state.entities,
            selected_device_id: state.selected(),
        }
    }
}
