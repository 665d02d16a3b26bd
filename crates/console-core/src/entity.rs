//! # Entity Slices
//!
//! A normalized cache of records keyed by derived identifier, plus a
//! selection pointer. Devices and gateways are both stored this way.
//!
//! ## Sharing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Structural Sharing                                 │
//! │                                                                         │
//! │  Arc<EntityState> ──► entities: Arc<BTreeMap<key, Record>>             │
//! │                       selected: Option<key>                            │
//! │                                                                         │
//! │  select()      new EntityState, SAME entities Arc                      │
//! │  upsert()      new EntityState, new entities map                       │
//! │  upsert_all()  new EntityState, ONE new entities map for the batch     │
//! │  no-op         the input Arc itself                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers can therefore detect "nothing changed" with `Arc::ptr_eq`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ids::IdSelector;
use crate::record::{merge_into, merge_record, Record};

/// Keyed records plus the currently selected key.
///
/// ## Invariants
/// - Each value is the right-fold merge of every upsert received for its key
/// - `selected` may name a key that is not (yet) in `entities`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entities: Arc<BTreeMap<String, Record>>,
    pub selected: Option<String>,
}

impl EntityState {
    /// Creates an empty slice.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.entities.get(key)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected record, if it has arrived.
    pub fn selected_entity(&self) -> Option<&Record> {
        self.selected().and_then(|key| self.get(key))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Points the selection at `key`. The entity map is shared, not copied.
pub fn select(state: &Arc<EntityState>, key: &str) -> Arc<EntityState> {
    if state.selected() == Some(key) {
        return Arc::clone(state);
    }

    debug!(key, "Selection changed");
    Arc::new(EntityState {
        entities: Arc::clone(&state.entities),
        selected: Some(key.to_string()),
    })
}

/// Merges one record into the slice under its derived key.
///
/// Records without a key are skipped with a warning.
pub fn upsert(
    state: &Arc<EntityState>,
    record: &Record,
    ids: &dyn IdSelector,
    entity: &'static str,
) -> Arc<EntityState> {
    let Some(key) = ids.select(record) else {
        warn!(entity, "Record has no identifier, skipping");
        return Arc::clone(state);
    };

    let mut entities = (*state.entities).clone();
    let merged = merge_record(entities.get(&key), record);
    debug!(entity, key = %key, fields = merged.len(), "Upserted record");
    entities.insert(key, merged);

    Arc::new(EntityState {
        entities: Arc::new(entities),
        selected: state.selected.clone(),
    })
}

/// Merges a batch of records, in order, into one accumulator seeded from the
/// current map, then commits it as a single new slice.
///
/// The result equals calling [`upsert`] once per record in the same order.
/// An empty batch (or one where no record has a key) returns `state` itself.
pub fn upsert_all(
    state: &Arc<EntityState>,
    records: &[Record],
    ids: &dyn IdSelector,
    entity: &'static str,
) -> Arc<EntityState> {
    if records.is_empty() {
        return Arc::clone(state);
    }

    let mut entities = (*state.entities).clone();
    let mut applied = 0usize;

    for record in records {
        match ids.select(record) {
            Some(key) => {
                merge_into(entities.entry(key).or_default(), record);
                applied += 1;
            }
            None => warn!(entity, "Record in list has no identifier, skipping"),
        }
    }

    if applied == 0 {
        return Arc::clone(state);
    }

    debug!(entity, applied, total = entities.len(), "Upserted record list");
    Arc::new(EntityState {
        entities: Arc::new(entities),
        selected: state.selected.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FieldPath;
    use crate::record::into_record;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        into_record(value).unwrap()
    }

    fn ids() -> FieldPath {
        FieldPath::parse("id").unwrap()
    }

    #[test]
    fn test_select_shares_entities() {
        let state = upsert(
            &Arc::new(EntityState::new()),
            &record(json!({ "id": "a" })),
            &ids(),
            "test",
        );

        let next = select(&state, "a");

        assert!(Arc::ptr_eq(&state.entities, &next.entities));
        assert_eq!(next.selected(), Some("a"));
        assert_eq!(next.selected_entity(), state.get("a"));
    }

    #[test]
    fn test_reselecting_same_key_is_identity() {
        let state = select(&Arc::new(EntityState::new()), "a");
        assert!(Arc::ptr_eq(&state, &select(&state, "a")));
    }

    #[test]
    fn test_upsert_keeps_previous_state_intact() {
        let before = upsert(
            &Arc::new(EntityState::new()),
            &record(json!({ "id": "a", "name": "A" })),
            &ids(),
            "test",
        );
        let after = upsert(&before, &record(json!({ "id": "a", "name": "B" })), &ids(), "test");

        assert_eq!(before.get("a").unwrap()["name"], json!("A"));
        assert_eq!(after.get("a").unwrap()["name"], json!("B"));
    }

    #[test]
    fn test_upsert_without_key_is_skipped() {
        let state = Arc::new(EntityState::new());
        let next = upsert(&state, &record(json!({ "name": "nameless" })), &ids(), "test");
        assert!(Arc::ptr_eq(&state, &next));

        let next = upsert_all(&state, &[record(json!({ "name": "nameless" }))], &ids(), "test");
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_upsert_all_skips_only_unkeyed_records() {
        let state = Arc::new(EntityState::new());
        let next = upsert_all(
            &state,
            &[record(json!({ "name": "nameless" })), record(json!({ "id": "b" }))],
            &ids(),
            "test",
        );
        assert_eq!(next.len(), 1);
        assert!(next.get("b").is_some());
    }
}
