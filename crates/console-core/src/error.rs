//! # Error Types
//!
//! Domain-specific error types for console-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  console-core errors (this file)                                       │
//! │  └── CoreError        - Action decoding and selector construction      │
//! │                                                                         │
//! │  console-store errors (separate crate)                                 │
//! │  └── StoreError       - Config loading, wraps CoreError                │
//! │                                                                         │
//! │  Flow: CoreError → StoreError → anyhow (replay binary)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reducers never return errors. Everything here happens at the edges:
//! turning a wire envelope into an [`Action`](crate::action::Action), or
//! turning configuration strings into selectors.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A known action type carried a payload of the wrong shape.
    ///
    /// ## When This Occurs
    /// - `UPSERT_DEVICE` with a payload that is not a JSON object
    /// - `UPSERT_DEVICE_LIST` without an `entities` array
    /// - `SELECT_DEVICE` without a `deviceId` string
    #[error("Invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },

    /// Parent entity kind is not one the console knows about.
    #[error("Unknown parent kind: {0}")]
    InvalidParentKind(String),

    /// A dotted field path is empty or has an empty segment.
    #[error("Invalid field path: '{0}'")]
    InvalidFieldPath(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidPayload`].
    pub fn invalid_payload(action: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidPayload {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
