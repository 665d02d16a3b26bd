//! # Gateway Store Reducer
//!
//! Same shape as the device reducer: a keyed gateway cache plus the
//! selected gateway, which the gateway overview binding reads.

use std::sync::Arc;

use crate::action::Action;
use crate::entity::{self, EntityState};
use crate::ids::IdSelector;

const ENTITY: &str = "gateway";

/// Applies one action to the gateway slice.
pub fn reduce(state: &Arc<EntityState>, action: &Action, ids: &dyn IdSelector) -> Arc<EntityState> {
    match action {
        Action::SelectGateway { gateway_id } => entity::select(state, gateway_id),
        Action::UpsertGateway(record) => entity::upsert(state, record, ids, ENTITY),
        Action::UpsertGatewayList { entities } => {
            entity::upsert_all(state, entities, ids, ENTITY)
        }
        _ => Arc::clone(state),
    }
}
