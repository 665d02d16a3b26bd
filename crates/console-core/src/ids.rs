//! # Identifier Selection
//!
//! Derives the cache key of a record from its own fields.
//!
//! ## Key Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Device Key Derivation                              │
//! │                                                                         │
//! │  first hit wins:                                                        │
//! │    record.ids.device_id ──► record.device_id ──► record.id             │
//! │                                                                         │
//! │  every alternative yields the bare device id, so a full fetch result   │
//! │  and a partial update of the same device share one key                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selection must be deterministic: two records describing the same entity
//! always produce the same key. Alternatives of one selector therefore
//! belong to one key family; mixing a composite key with bare fallbacks
//! splits an entity across keys. A record with none of the configured fields
//! produces no key, and reducers skip it.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::record::Record;

/// Separator between the parts of a composite key.
pub const ID_SEPARATOR: &str = "/";

/// Derives a stable, non-empty key for a record.
pub trait IdSelector: Send + Sync {
    /// Returns the record's key, or `None` if the identifying fields are missing.
    fn select(&self, record: &Record) -> Option<String>;
}

// =============================================================================
// Field Path
// =============================================================================

/// A dotted path into nested objects, e.g. `ids.application_ids.application_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> CoreResult<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(CoreError::InvalidFieldPath(path.to_string()));
        }
        Ok(FieldPath { segments })
    }

    /// Resolves the path to a key fragment.
    ///
    /// Non-empty strings resolve as-is and numbers resolve to their decimal
    /// form. Anything else (missing, null, object, empty string) does not.
    pub fn resolve(&self, record: &Record) -> Option<String> {
        let (first, rest) = self.segments.split_first()?;
        let mut value = record.get(first)?;
        for segment in rest {
            value = value.as_object()?.get(segment)?;
        }
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl IdSelector for FieldPath {
    fn select(&self, record: &Record) -> Option<String> {
        self.resolve(record)
    }
}

// =============================================================================
// Composite Selector
// =============================================================================

/// Joins several field paths with [`ID_SEPARATOR`]. Every part must resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSelector {
    parts: Vec<FieldPath>,
}

impl CompositeSelector {
    /// Builds a composite selector from dotted paths.
    pub fn new<S: AsRef<str>>(paths: &[S]) -> CoreResult<Self> {
        if paths.is_empty() {
            return Err(CoreError::InvalidFieldPath(String::new()));
        }
        let parts = paths
            .iter()
            .map(|p| FieldPath::parse(p.as_ref()))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(CompositeSelector { parts })
    }
}

impl IdSelector for CompositeSelector {
    fn select(&self, record: &Record) -> Option<String> {
        let parts = self
            .parts
            .iter()
            .map(|p| p.resolve(record))
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join(ID_SEPARATOR))
    }
}

// =============================================================================
// Fallback Selector
// =============================================================================

/// Tries alternatives in order; the first that resolves wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSelector {
    alternatives: Vec<CompositeSelector>,
}

impl FallbackSelector {
    /// Builds a selector from a list of alternatives, each a list of paths.
    ///
    /// ## Example
    /// ```rust
    /// use console_core::ids::{FallbackSelector, IdSelector};
    /// use serde_json::json;
    ///
    /// let ids = FallbackSelector::from_paths(&[vec!["ids.device_id"], vec!["id"]]).unwrap();
    ///
    /// let record = json!({ "id": "dev-1" }).as_object().cloned().unwrap();
    /// assert_eq!(ids.select(&record).as_deref(), Some("dev-1"));
    /// ```
    pub fn from_paths<S: AsRef<str>>(alternatives: &[Vec<S>]) -> CoreResult<Self> {
        let alternatives = alternatives
            .iter()
            .map(|paths| CompositeSelector::new(paths.as_slice()))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(FallbackSelector { alternatives })
    }

    /// The device key selector used when nothing is configured.
    pub fn device_default() -> Self {
        Self::from_paths(&default_device_paths()).unwrap_or_else(|_| Self::empty())
    }

    /// The gateway key selector used when nothing is configured.
    pub fn gateway_default() -> Self {
        Self::from_paths(&default_gateway_paths()).unwrap_or_else(|_| Self::empty())
    }

    fn empty() -> Self {
        FallbackSelector {
            alternatives: Vec::new(),
        }
    }
}

impl IdSelector for FallbackSelector {
    fn select(&self, record: &Record) -> Option<String> {
        self.alternatives.iter().find_map(|alt| alt.select(record))
    }
}

/// Default device key paths. All resolve to the bare device id, the same
/// id `SELECT_DEVICE` and `GET_DEV` carry.
pub fn default_device_paths() -> Vec<Vec<String>> {
    owned_paths(&[&["ids.device_id"], &["device_id"], &["id"]])
}

/// Default gateway key paths.
pub fn default_gateway_paths() -> Vec<Vec<String>> {
    owned_paths(&[&["ids.gateway_id"], &["gateway_id"], &["id"]])
}

fn owned_paths(paths: &[&[&str]]) -> Vec<Vec<String>> {
    paths
        .iter()
        .map(|alt| alt.iter().map(|p| p.to_string()).collect())
        .collect()
}
