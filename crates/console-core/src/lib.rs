//! # console-core: Pure State Logic for the Device Console
//!
//! This crate holds the console's client-side state model as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Device Console Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentational layer (external)                 │   │
//! │  │        Device list ──► Device overview ──► Gateway overview     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ props / load_data                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        console-store: Store, dispatch, view bindings            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ console-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  record  │ │   ids    │ │  action  │ │ devices/gateways │  │   │
//! │  │   │  merge   │ │ selectors│ │ envelope │ │ lists / state    │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CHANNELS • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`record`] - Record type and right-biased shallow merge
//! - [`ids`] - Identifier selectors (field paths, composite keys)
//! - [`action`] - Actions and the wire envelope they arrive in
//! - [`entity`] - Keyed entity slice shared by devices and gateways
//! - [`devices`] - Device store reducer
//! - [`gateways`] - Gateway store reducer
//! - [`lists`] - Collaborator / API key list slices
//! - [`state`] - Root state and combined reducer
//! - [`selectors`] - Read-only projections
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use console_core::{Action, ConsoleState, Reducer};
//! use serde_json::json;
//!
//! let reducer = Reducer::default();
//! let state = Arc::new(ConsoleState::new());
//!
//! let record = json!({ "id": "dev-1", "name": "A" }).as_object().cloned().unwrap();
//! let state = reducer.reduce(&state, &Action::UpsertDevice(record));
//!
//! let record = json!({ "id": "dev-1", "battery": 80 }).as_object().cloned().unwrap();
//! let state = reducer.reduce(&state, &Action::UpsertDevice(record));
//!
//! let device = state.devices.get("dev-1").unwrap();
//! assert_eq!(device["name"], json!("A"));
//! assert_eq!(device["battery"], json!(80));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod action;
pub mod devices;
pub mod entity;
pub mod error;
pub mod gateways;
pub mod ids;
pub mod lists;
pub mod record;
pub mod selectors;
pub mod state;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use action::{Action, ActionEnvelope, ListKind, ParentKind, ParentRef};
pub use entity::EntityState;
pub use error::{CoreError, CoreResult};
pub use ids::{CompositeSelector, FallbackSelector, FieldPath, IdSelector};
pub use lists::{ListPage, ListState};
pub use record::{merge_record, Record};
pub use state::{ConsoleState, Reducer};
