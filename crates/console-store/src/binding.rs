//! # Gateway Overview Binding
//!
//! Projects the view model of the gateway overview screen out of
//! [`ConsoleState`] and issues the screen's data-loading intents.
//!
//! ## Binding Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Gateway Overview Binding                             │
//! │                                                                         │
//! │  View lifecycle         Binding                   Store                 │
//! │  ──────────────         ───────                   ─────                 │
//! │                                                                         │
//! │  initialized ─────────► init() ── per gateway ──► GET_*COLLABORATORS_*  │
//! │                                                   GET_API_KEYS_LIST     │
//! │                                                                         │
//! │  state changed ───────► props() ◄─────────────── ConsoleState          │
//! │                           │                                             │
//! │                           ▼                                             │
//! │                 { gtwId, gateway, collaboratorsTotalCount,              │
//! │                   apiKeysTotalCount, statusBarFetching }                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Loading Flag
//! `statusBarFetching` stays true until BOTH counts are known and NEITHER
//! list reports an outstanding request.
//!
//! One binding serves both collaborator endpoints; which one is read and
//! requested is decided by its [`CollaboratorSource`].

use std::sync::{Arc, Mutex, PoisonError};

use console_core::{
    selectors, Action, ConsoleState, EntityState, ListKind, ListState, ParentRef, Record,
};
use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use crate::config::{CollaboratorSource, ConsoleConfig};
use crate::store::Dispatch;

/// Input properties of the gateway overview view.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GatewayOverviewProps {
    /// Selected gateway identifier.
    pub gtw_id: Option<String>,

    /// Selected gateway record, once loaded.
    #[ts(type = "Record<string, unknown> | null")]
    pub gateway: Option<Record>,

    pub collaborators_total_count: Option<u64>,

    pub api_keys_total_count: Option<u64>,

    /// True while either count is unknown or either list is loading.
    pub status_bar_fetching: bool,
}

impl GatewayOverviewProps {
    /// Computes props from state. Pure; no memoization.
    pub fn project(state: &ConsoleState, source: CollaboratorSource) -> Self {
        let gtw_id = selectors::selected_gateway_id(state).map(str::to_string);
        let parent = gtw_id.as_deref().map(ParentRef::gateway);
        let collaborators = source.list_kind();

        let collaborators_total_count = parent
            .as_ref()
            .and_then(|p| selectors::list_total_count(state, collaborators, p));
        let api_keys_total_count = parent
            .as_ref()
            .and_then(|p| selectors::list_total_count(state, ListKind::ApiKeys, p));

        let status_bar_fetching = collaborators_total_count.is_none()
            || api_keys_total_count.is_none()
            || selectors::list_fetching(state, collaborators)
            || selectors::list_fetching(state, ListKind::ApiKeys);

        GatewayOverviewProps {
            gtw_id,
            gateway: selectors::selected_gateway(state).cloned(),
            collaborators_total_count,
            api_keys_total_count,
            status_bar_fetching,
        }
    }
}

/// Inputs and output of the last projection.
struct Memo {
    gateways: Arc<EntityState>,
    collaborators: Arc<ListState>,
    api_keys: Arc<ListState>,
    props: Arc<GatewayOverviewProps>,
}

impl Memo {
    fn matches(&self, state: &ConsoleState, collaborators: ListKind) -> bool {
        Arc::ptr_eq(&self.gateways, &state.gateways)
            && Arc::ptr_eq(&self.collaborators, state.list(collaborators))
            && Arc::ptr_eq(&self.api_keys, &state.api_keys)
    }
}

/// Binding between console state and the gateway overview view.
pub struct GatewayOverviewBinding {
    source: CollaboratorSource,
    memo: Mutex<Option<Memo>>,
    loaded_for: Mutex<Option<String>>,
}

impl GatewayOverviewBinding {
    pub fn new(source: CollaboratorSource) -> Self {
        GatewayOverviewBinding {
            source,
            memo: Mutex::new(None),
            loaded_for: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.collaborator_source())
    }

    pub fn source(&self) -> CollaboratorSource {
        self.source
    }

    /// Props for the current state.
    ///
    /// While the gateway, collaborator and API key slices are the same
    /// `Arc`s as on the previous call, the previous props `Arc` is returned,
    /// so the view can skip re-rendering with a pointer comparison.
    pub fn props(&self, state: &ConsoleState) -> Arc<GatewayOverviewProps> {
        let collaborators = self.source.list_kind();
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = memo.as_ref() {
            if cached.matches(state, collaborators) {
                return Arc::clone(&cached.props);
            }
        }

        let props = Arc::new(GatewayOverviewProps::project(state, self.source));
        *memo = Some(Memo {
            gateways: Arc::clone(&state.gateways),
            collaborators: Arc::clone(state.list(collaborators)),
            api_keys: Arc::clone(&state.api_keys),
            props: Arc::clone(&props),
        });
        props
    }

    /// Requests the collaborator and API key lists of a gateway.
    ///
    /// Issues exactly two fetch intents and returns without waiting.
    /// Completion shows up later through the lists' loading flags.
    pub fn load_data(&self, dispatch: &dyn Dispatch, gateway_id: &str) {
        debug!(gateway_id, source = %self.source, "Loading gateway overview data");

        dispatch.dispatch(Action::ListRequested {
            kind: self.source.list_kind(),
            parent: ParentRef::gateway(gateway_id),
        });
        dispatch.dispatch(Action::ListRequested {
            kind: ListKind::ApiKeys,
            parent: ParentRef::gateway(gateway_id),
        });
    }

    /// Initialization hook of the owning view.
    ///
    /// Loads data for the selected gateway once per gateway: later calls
    /// with the same gateway selected do nothing, and selecting a different
    /// gateway re-arms the hook. Returns whether loading was triggered.
    pub fn init(&self, dispatch: &dyn Dispatch, state: &ConsoleState) -> bool {
        let Some(gateway_id) = selectors::selected_gateway_id(state) else {
            debug!("No gateway selected, deferring overview load");
            return false;
        };

        {
            let mut loaded_for = self.loaded_for.lock().unwrap_or_else(PoisonError::into_inner);
            if loaded_for.as_deref() == Some(gateway_id) {
                return false;
            }
            *loaded_for = Some(gateway_id.to_string());
        }

        info!(gateway_id, "Gateway overview initialized");
        self.load_data(dispatch, gateway_id);
        true
    }
}

impl std::fmt::Debug for GatewayOverviewBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayOverviewBinding")
            .field("source", &self.source)
            .field("loaded_for", &self.loaded_for.lock().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use console_core::record::into_record;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        actions: Mutex<Vec<Action>>,
    }

    impl Dispatch for Recorder {
        fn dispatch(&self, action: Action) {
            self.actions.lock().unwrap().push(action);
        }
    }

    impl Recorder {
        fn taken(&self) -> Vec<Action> {
            std::mem::take(&mut *self.actions.lock().unwrap())
        }
    }

    fn list_ok(kind: ListKind, gateway: &str, total: u64) -> Action {
        Action::ListSucceeded {
            kind,
            parent: ParentRef::gateway(gateway),
            entities: vec![],
            total_count: Some(total),
        }
    }

    fn select_gateway(store: &Store, id: &str) {
        store.dispatch(Action::SelectGateway {
            gateway_id: id.to_string(),
        });
    }

    #[test]
    fn test_props_while_nothing_loaded() {
        let props = GatewayOverviewProps::project(&ConsoleState::new(), CollaboratorSource::Shared);

        assert_eq!(props.gtw_id, None);
        assert_eq!(props.gateway, None);
        assert!(props.status_bar_fetching);
    }

    #[test]
    fn test_fetching_until_both_counts_known() {
        let store = Store::with_defaults();
        select_gateway(&store, "gtw-1");
        fn project(state: &ConsoleState) -> GatewayOverviewProps {
            GatewayOverviewProps::project(state, CollaboratorSource::Shared)
        }

        store.dispatch(list_ok(ListKind::Collaborators, "gtw-1", 3));
        let props = project(&store.state());
        assert_eq!(props.collaborators_total_count, Some(3));
        assert_eq!(props.api_keys_total_count, None);
        assert!(props.status_bar_fetching);

        store.dispatch(list_ok(ListKind::ApiKeys, "gtw-1", 0));
        let props = project(&store.state());
        assert_eq!(props.api_keys_total_count, Some(0));
        assert!(!props.status_bar_fetching);

        // A refresh in flight flips the flag back on even though counts are known.
        store.dispatch(Action::ListRequested {
            kind: ListKind::ApiKeys,
            parent: ParentRef::gateway("gtw-1"),
        });
        assert!(project(&store.state()).status_bar_fetching);
    }

    #[test]
    fn test_counts_of_other_gateways_are_ignored() {
        let store = Store::with_defaults();
        select_gateway(&store, "gtw-1");
        store.dispatch(list_ok(ListKind::Collaborators, "gtw-2", 3));
        store.dispatch(list_ok(ListKind::ApiKeys, "gtw-2", 1));

        let props = GatewayOverviewProps::project(&store.state(), CollaboratorSource::Shared);
        assert_eq!(props.collaborators_total_count, None);
        assert!(props.status_bar_fetching);
    }

    #[test]
    fn test_source_selects_collaborator_slice() {
        let store = Store::with_defaults();
        select_gateway(&store, "gtw-1");
        store.dispatch(list_ok(ListKind::GatewayCollaborators, "gtw-1", 5));

        let shared = GatewayOverviewProps::project(&store.state(), CollaboratorSource::Shared);
        let scoped =
            GatewayOverviewProps::project(&store.state(), CollaboratorSource::GatewayScoped);

        assert_eq!(shared.collaborators_total_count, None);
        assert_eq!(scoped.collaborators_total_count, Some(5));
    }

    #[test]
    fn test_props_include_selected_gateway() {
        let store = Store::with_defaults();
        store.dispatch(Action::UpsertGateway(
            into_record(json!({ "ids": { "gateway_id": "gtw-1" }, "name": "Roof" })).unwrap(),
        ));
        select_gateway(&store, "gtw-1");

        let props = GatewayOverviewProps::project(&store.state(), CollaboratorSource::Shared);
        assert_eq!(props.gtw_id.as_deref(), Some("gtw-1"));
        assert_eq!(props.gateway.unwrap()["name"], json!("Roof"));
    }

    #[test]
    fn test_props_json_shape() {
        let props = GatewayOverviewProps {
            gtw_id: Some("gtw-1".to_string()),
            gateway: None,
            collaborators_total_count: Some(2),
            api_keys_total_count: Some(1),
            status_bar_fetching: false,
        };

        assert_eq!(
            serde_json::to_value(&props).unwrap(),
            json!({
                "gtwId": "gtw-1",
                "gateway": null,
                "collaboratorsTotalCount": 2,
                "apiKeysTotalCount": 1,
                "statusBarFetching": false,
            })
        );
    }

    #[test]
    fn test_props_are_memoized() {
        let store = Store::with_defaults();
        let binding = GatewayOverviewBinding::new(CollaboratorSource::Shared);
        select_gateway(&store, "gtw-1");

        let first = binding.props(&store.state());

        // Unrelated slices change: same props.
        store.dispatch(Action::UpsertDevice(into_record(json!({ "id": "dev-1" })).unwrap()));
        store.dispatch(list_ok(ListKind::GatewayCollaborators, "gtw-1", 9));
        assert!(Arc::ptr_eq(&first, &binding.props(&store.state())));

        // A watched slice changes: new props.
        store.dispatch(list_ok(ListKind::ApiKeys, "gtw-1", 1));
        let second = binding.props(&store.state());
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.api_keys_total_count, Some(1));
    }

    #[test]
    fn test_load_data_dispatches_two_intents() {
        let recorder = Recorder::default();

        GatewayOverviewBinding::new(CollaboratorSource::Shared).load_data(&recorder, "gtw-1");
        assert_eq!(
            recorder.taken(),
            vec![
                Action::ListRequested {
                    kind: ListKind::Collaborators,
                    parent: ParentRef::gateway("gtw-1"),
                },
                Action::ListRequested {
                    kind: ListKind::ApiKeys,
                    parent: ParentRef::gateway("gtw-1"),
                },
            ]
        );

        let scoped = GatewayOverviewBinding::new(CollaboratorSource::GatewayScoped);
        scoped.load_data(&recorder, "gtw-1");
        let actions = recorder.taken();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].type_name(), "GET_GTW_COLLABORATORS_LIST");
        assert_eq!(actions[1].type_name(), "GET_API_KEYS_LIST");
    }

    #[test]
    fn test_init_loads_once() {
        let recorder = Recorder::default();
        let binding = GatewayOverviewBinding::new(CollaboratorSource::Shared);

        // Nothing selected yet: the hook stays armed.
        assert!(!binding.init(&recorder, &ConsoleState::new()));
        assert!(recorder.taken().is_empty());

        let store = Store::with_defaults();
        select_gateway(&store, "gtw-1");

        assert!(binding.init(&recorder, &store.state()));
        assert_eq!(recorder.taken().len(), 2);

        assert!(!binding.init(&recorder, &store.state()));
        assert!(recorder.taken().is_empty());
    }

    #[test]
    fn test_init_reloads_for_newly_selected_gateway() {
        let store = Store::with_defaults();
        let binding = GatewayOverviewBinding::new(CollaboratorSource::Shared);

        select_gateway(&store, "gtw-1");
        assert!(binding.init(&store, &store.state()));
        store.dispatch(list_ok(ListKind::Collaborators, "gtw-1", 1));
        store.dispatch(list_ok(ListKind::ApiKeys, "gtw-1", 1));

        select_gateway(&store, "gtw-2");
        let recorder = Recorder::default();
        assert!(binding.init(&recorder, &store.state()));
        assert_eq!(
            recorder.taken(),
            vec![
                Action::ListRequested {
                    kind: ListKind::Collaborators,
                    parent: ParentRef::gateway("gtw-2"),
                },
                Action::ListRequested {
                    kind: ListKind::ApiKeys,
                    parent: ParentRef::gateway("gtw-2"),
                },
            ]
        );
        assert!(!binding.init(&recorder, &store.state()));

        store.dispatch(list_ok(ListKind::Collaborators, "gtw-2", 4));
        store.dispatch(list_ok(ListKind::ApiKeys, "gtw-2", 2));
        let props = binding.props(&store.state());
        assert_eq!(props.gtw_id.as_deref(), Some("gtw-2"));
        assert!(!props.status_bar_fetching);
    }

    #[test]
    fn test_init_against_store_publishes_intents() {
        let store = Store::with_defaults();
        let mut intents = store.subscribe_intents();
        let binding = GatewayOverviewBinding::new(CollaboratorSource::Shared);
        select_gateway(&store, "gtw-1");

        assert!(binding.init(&store, &store.state()));

        assert_eq!(intents.try_recv().unwrap().type_name(), "GET_COLLABORATORS_LIST");
        assert_eq!(intents.try_recv().unwrap().type_name(), "GET_API_KEYS_LIST");

        let props = binding.props(&store.state());
        assert!(props.status_bar_fetching);
    }
}
