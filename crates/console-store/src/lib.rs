//! # console-store: Store Runtime for the Device Console
//!
//! Wraps the pure reducers of `console-core` in a live, thread-safe store
//! and binds views to it.
//!
//! ## Runtime Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        console-store                                    │
//! │                                                                         │
//! │   JSON envelope ──► dispatch_json ──┐                                   │
//! │                                     ▼                                   │
//! │   Action ─────────────────────► Store::dispatch                        │
//! │                                     │                                   │
//! │                      ┌──────────────┼─────────────────┐                 │
//! │                      ▼              ▼                 ▼                 │
//! │               Reducer::reduce   watch channel   broadcast channel       │
//! │               (console-core)    (new states)    (fetch intents)         │
//! │                                     │                 │                 │
//! │                                     ▼                 ▼                 │
//! │                     GatewayOverviewBinding     fetch layer (external)   │
//! │                     props() / init()                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - Store, serialized dispatch and subscriptions
//! - [`binding`] - Gateway overview view binding
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Store error types
//!
//! ## Example Usage
//!
//! ```rust
//! use console_store::{CollaboratorSource, GatewayOverviewBinding, Store};
//!
//! let store = Store::with_defaults();
//! let binding = GatewayOverviewBinding::new(CollaboratorSource::Shared);
//!
//! store
//!     .dispatch_json(r#"{"type":"GET_GTW","payload":{"id":"gtw-1"}}"#)
//!     .unwrap();
//! assert!(binding.init(&store, &store.state()));
//!
//! let props = binding.props(&store.state());
//! assert_eq!(props.gtw_id.as_deref(), Some("gtw-1"));
//! assert!(props.status_bar_fetching);
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod store;

pub use binding::{GatewayOverviewBinding, GatewayOverviewProps};
pub use config::{CollaboratorSource, ConsoleConfig};
pub use error::{StoreError, StoreResult};
pub use store::{Dispatch, Store};
