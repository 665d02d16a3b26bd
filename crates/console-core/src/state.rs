//! # Console State
//!
//! The root state object and the reducer that combines every slice.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ConsoleState                                    │
//! │                                                                         │
//! │  devices ──────────────── Arc<EntityState>   (device cache + selection) │
//! │  gateways ─────────────── Arc<EntityState>   (gateway cache + selection)│
//! │  collaborators ────────── Arc<ListState>     GET_COLLABORATORS_LIST     │
//! │  gateway_collaborators ── Arc<ListState>     GET_GTW_COLLABORATORS_LIST │
//! │  api_keys ─────────────── Arc<ListState>     GET_API_KEYS_LIST          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every action runs through every slice reducer. When all slices hand back
//! their input `Arc`, the root reducer hands back the input root `Arc`, so
//! an unrecognized action is observable as reference identity all the way up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::action::{Action, ListKind};
use crate::entity::EntityState;
use crate::ids::{FallbackSelector, IdSelector};
use crate::lists::{self, ListState};
use crate::{devices, gateways};

/// Root console state. Cheap to clone: every slice is behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleState {
    pub devices: Arc<EntityState>,
    pub gateways: Arc<EntityState>,
    pub collaborators: Arc<ListState>,
    pub gateway_collaborators: Arc<ListState>,
    pub api_keys: Arc<ListState>,
}

impl ConsoleState {
    /// Empty state, as at session start.
    pub fn new() -> Self {
        Self::default()
    }

    /// The list slice of the given kind.
    pub fn list(&self, kind: ListKind) -> &Arc<ListState> {
        match kind {
            ListKind::Collaborators => &self.collaborators,
            ListKind::GatewayCollaborators => &self.gateway_collaborators,
            ListKind::ApiKeys => &self.api_keys,
        }
    }
}

/// The root reducer. Owns the identifier selectors for keyed slices.
pub struct Reducer {
    device_ids: Box<dyn IdSelector>,
    gateway_ids: Box<dyn IdSelector>,
}

impl Reducer {
    pub fn new(device_ids: Box<dyn IdSelector>, gateway_ids: Box<dyn IdSelector>) -> Self {
        Reducer {
            device_ids,
            gateway_ids,
        }
    }

    /// Applies one action to the whole state.
    pub fn reduce(&self, state: &Arc<ConsoleState>, action: &Action) -> Arc<ConsoleState> {
        let next = ConsoleState {
            devices: devices::reduce(&state.devices, action, self.device_ids.as_ref()),
            gateways: gateways::reduce(&state.gateways, action, self.gateway_ids.as_ref()),
            collaborators: lists::reduce(&state.collaborators, action, ListKind::Collaborators),
            gateway_collaborators: lists::reduce(
                &state.gateway_collaborators,
                action,
                ListKind::GatewayCollaborators,
            ),
            api_keys: lists::reduce(&state.api_keys, action, ListKind::ApiKeys),
        };

        if next.same_slices(state) {
            trace!(action = %action.type_name(), "Action left state unchanged");
            return Arc::clone(state);
        }
        Arc::new(next)
    }
}

impl ConsoleState {
    fn same_slices(&self, other: &ConsoleState) -> bool {
        Arc::ptr_eq(&self.devices, &other.devices)
            && Arc::ptr_eq(&self.gateways, &other.gateways)
            && Arc::ptr_eq(&self.collaborators, &other.collaborators)
            && Arc::ptr_eq(&self.gateway_collaborators, &other.gateway_collaborators)
            && Arc::ptr_eq(&self.api_keys, &other.api_keys)
    }
}

impl Default for Reducer {
    /// Reducer with the default device and gateway key selectors.
    fn default() -> Self {
        Reducer::new(
            Box::new(FallbackSelector::device_default()),
            Box::new(FallbackSelector::gateway_default()),
        )
    }
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionEnvelope, ParentRef};
    use crate::record::into_record;
    use serde_json::json;

    #[test]
    fn test_unknown_action_keeps_root_reference() {
        let reducer = Reducer::default();
        let state = Arc::new(ConsoleState::new());

        let next = reducer.reduce(&state, &Action::Unknown("@@INIT".to_string()));

        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_only_targeted_slice_changes() {
        let reducer = Reducer::default();
        let state = Arc::new(ConsoleState::new());

        let next = reducer.reduce(
            &state,
            &Action::UpsertDevice(into_record(json!({ "id": "dev-1" })).unwrap()),
        );

        assert!(!Arc::ptr_eq(&state, &next));
        assert!(!Arc::ptr_eq(&state.devices, &next.devices));
        assert!(Arc::ptr_eq(&state.gateways, &next.gateways));
        assert!(Arc::ptr_eq(&state.collaborators, &next.collaborators));
        assert!(Arc::ptr_eq(&state.api_keys, &next.api_keys));
        assert!(next.devices.get("dev-1").is_some());
    }

    #[test]
    fn test_list_kind_routes_to_its_slice() {
        let reducer = Reducer::default();
        let state = Arc::new(ConsoleState::new());

        let next = reducer.reduce(
            &state,
            &Action::ListRequested {
                kind: ListKind::GatewayCollaborators,
                parent: ParentRef::gateway("gtw-1"),
            },
        );

        assert!(next.list(ListKind::GatewayCollaborators).fetching);
        assert!(!next.list(ListKind::Collaborators).fetching);
        assert!(Arc::ptr_eq(&state.collaborators, &next.collaborators));
    }

    #[test]
    fn test_partial_update_merges_into_fetched_device() {
        let reducer = Reducer::default();
        let mut state = Arc::new(ConsoleState::new());

        for (kind, payload) in [
            (
                "GET_DEV_SUCCESS",
                json!({
                    "ids": {
                        "device_id": "dev-1",
                        "application_ids": { "application_id": "app-1" }
                    },
                    "name": "A"
                }),
            ),
            ("UPDATE_DEV_SUCCESS", json!({ "ids": { "device_id": "dev-1" }, "battery": 80 })),
            ("GET_DEV", json!({ "deviceId": "dev-1" })),
        ] {
            let action = Action::decode(ActionEnvelope::new(kind, payload)).unwrap();
            state = reducer.reduce(&state, &action);
        }

        assert_eq!(state.devices.len(), 1);
        let device = crate::selectors::selected_device(&state).unwrap();
        assert_eq!(device["name"], json!("A"));
        assert_eq!(device["battery"], json!(80));
    }
}
