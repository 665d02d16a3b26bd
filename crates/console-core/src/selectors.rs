//! # Selectors
//!
//! Read-only projections of [`ConsoleState`] used by view bindings.

use crate::action::{ListKind, ParentRef};
use crate::record::Record;
use crate::state::ConsoleState;

pub fn selected_device_id(state: &ConsoleState) -> Option<&str> {
    state.devices.selected()
}

pub fn selected_device(state: &ConsoleState) -> Option<&Record> {
    state.devices.selected_entity()
}

pub fn device<'a>(state: &'a ConsoleState, key: &str) -> Option<&'a Record> {
    state.devices.get(key)
}

pub fn selected_gateway_id(state: &ConsoleState) -> Option<&str> {
    state.gateways.selected()
}

pub fn selected_gateway(state: &ConsoleState) -> Option<&Record> {
    state.gateways.selected_entity()
}

/// Total count of a list for one parent; `None` until known.
pub fn list_total_count(state: &ConsoleState, kind: ListKind, parent: &ParentRef) -> Option<u64> {
    state.list(kind).total_count(parent)
}

/// Whether a request for the list is in flight.
pub fn list_fetching(state: &ConsoleState, kind: ListKind) -> bool {
    state.list(kind).fetching
}
