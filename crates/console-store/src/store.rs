//! # Store
//!
//! Owns the live [`ConsoleState`] and applies actions to it one at a time.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Store::dispatch(action)                          │
//! │                                                                         │
//! │  1. Lock state ─────────────► exactly one action applied at a time     │
//! │                                                                         │
//! │  2. Reducer::reduce ────────► new Arc<ConsoleState> or the same one    │
//! │                                                                         │
//! │  3. Changed? ───── yes ─────► replace state, notify watch subscribers  │
//! │        │                                                                │
//! │        └──────── no ──────► nothing published                          │
//! │                                                                         │
//! │  4. Fetch intent? ──────────► publish on the intent broadcast channel  │
//! │                               (still under the lock; no receivers ok)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! `Store` is `Send + Sync`; share it behind an `Arc`. The state lock is
//! held for the reduction, the notification and the intent publish, so
//! subscribers never see states or intents out of order and never see a list
//! upsert half applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use console_core::{Action, ActionEnvelope, ConsoleState, Reducer};
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

use crate::config::{ConsoleConfig, StoreSettings, MAX_INTENT_CAPACITY};
use crate::error::StoreResult;

/// Anything that accepts actions.
///
/// View bindings depend on this rather than on [`Store`] so they can be
/// driven by a recording dispatcher in tests.
pub trait Dispatch {
    fn dispatch(&self, action: Action);
}

/// The console's single source of truth.
pub struct Store {
    reducer: Reducer,
    state: Mutex<Arc<ConsoleState>>,
    changes: watch::Sender<Arc<ConsoleState>>,
    intents: broadcast::Sender<Action>,
}

impl Store {
    /// Creates a store holding an empty state.
    pub fn new(reducer: Reducer, settings: &StoreSettings) -> Self {
        let initial = Arc::new(ConsoleState::new());
        let (changes, _) = watch::channel(Arc::clone(&initial));
        let capacity = settings.intent_capacity.clamp(1, MAX_INTENT_CAPACITY);
        let (intents, _) = broadcast::channel(capacity);

        Store {
            reducer,
            state: Mutex::new(initial),
            changes,
            intents,
        }
    }

    /// Creates a store from loaded configuration.
    pub fn from_config(config: &ConsoleConfig) -> StoreResult<Self> {
        Ok(Store::new(config.ids.reducer()?, &config.store))
    }

    /// Creates a store with default selectors and settings.
    pub fn with_defaults() -> Self {
        Store::new(Reducer::default(), &StoreSettings::default())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Arc<ConsoleState> {
        Arc::clone(&self.lock())
    }

    /// Applies an action. Returns true if the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        let mut state = self.lock();
        let next = self.reducer.reduce(&state, &action);
        let changed = !Arc::ptr_eq(&state, &next);
        if changed {
            *state = Arc::clone(&next);
            self.changes.send_replace(next);
        }

        debug!(action = %action.type_name(), changed, "Dispatched action");

        // Published under the lock so intents keep reduction order.
        if action.is_intent() {
            let receivers = self.intents.send(action).unwrap_or(0);
            trace!(receivers, "Published fetch intent");
        }

        changed
    }

    /// Decodes a wire envelope and dispatches it.
    pub fn dispatch_envelope(&self, envelope: ActionEnvelope) -> StoreResult<bool> {
        let action = Action::decode(envelope)?;
        Ok(Store::dispatch(self, action))
    }

    /// Parses one JSON envelope (`{"type": ..., "payload": ...}`) and dispatches it.
    pub fn dispatch_json(&self, json: &str) -> StoreResult<bool> {
        let envelope: ActionEnvelope = serde_json::from_str(json)?;
        self.dispatch_envelope(envelope)
    }

    /// Subscribes to state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ConsoleState>> {
        self.changes.subscribe()
    }

    /// Subscribes to fetch intents dispatched from now on.
    pub fn subscribe_intents(&self) -> broadcast::Receiver<Action> {
        self.intents.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Arc<ConsoleState>> {
        // Reducers do not panic, and the guarded value is a plain Arc swap.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Dispatch for Store {
    fn dispatch(&self, action: Action) {
        Store::dispatch(self, action);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
