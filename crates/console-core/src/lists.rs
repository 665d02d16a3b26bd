//! # List Slices
//!
//! Paged lists owned by a parent entity (collaborators and API keys of a
//! gateway, an application, ...), tracked with a loading flag.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    List Fetch Lifecycle                                 │
//! │                                                                         │
//! │  ListRequested ──► fetching = true, error cleared                      │
//! │        │                                                                │
//! │        ├──► ListSucceeded ──► pages[parent] replaced, fetching = false │
//! │        │                                                                │
//! │        └──► ListFailed ─────► error set, fetching = false,             │
//! │                               previous page kept                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One reducer serves every [`ListKind`]; each slice only reacts to actions
//! carrying its own kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::action::{Action, ListKind, ParentRef};

/// One fetched page of a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ListPage {
    /// Entries as returned by the API.
    #[ts(type = "Array<unknown>")]
    pub entities: Vec<Value>,

    /// Total number of entries on the server, if reported.
    pub total_count: Option<u64>,
}

/// All pages of one list kind, keyed by [`ParentRef::key`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListState {
    pub pages: BTreeMap<String, ListPage>,

    /// True while a request for this list is outstanding.
    pub fetching: bool,

    /// Message of the last failed request, cleared by the next request.
    pub error: Option<String>,
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, parent: &ParentRef) -> Option<&ListPage> {
        self.pages.get(&parent.key())
    }

    /// Total count for a parent; `None` until a page reporting it arrives.
    pub fn total_count(&self, parent: &ParentRef) -> Option<u64> {
        self.page(parent).and_then(|page| page.total_count)
    }
}

/// Applies one action to the list slice of kind `slice`.
pub fn reduce(state: &Arc<ListState>, action: &Action, slice: ListKind) -> Arc<ListState> {
    match action {
        Action::ListRequested { kind, parent } if *kind == slice => {
            if state.fetching && state.error.is_none() {
                return Arc::clone(state);
            }
            debug!(list = %slice, parent = %parent.key(), "List requested");
            Arc::new(ListState {
                pages: state.pages.clone(),
                fetching: true,
                error: None,
            })
        }
        Action::ListSucceeded {
            kind,
            parent,
            entities,
            total_count,
        } if *kind == slice => {
            debug!(list = %slice, parent = %parent.key(), count = entities.len(), "List received");
            let mut pages = state.pages.clone();
            pages.insert(
                parent.key(),
                ListPage {
                    entities: entities.clone(),
                    total_count: *total_count,
                },
            );
            Arc::new(ListState {
                pages,
                fetching: false,
                error: None,
            })
        }
        Action::ListFailed {
            kind,
            parent,
            error,
        } if *kind == slice => {
            warn!(list = %slice, parent = %parent.key(), %error, "List request failed");
            Arc::new(ListState {
                pages: state.pages.clone(),
                fetching: false,
                error: Some(error.clone()),
            })
        }
        _ => Arc::clone(state),
    }
}
