//! Status transition audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entrepot_core::{Actor, EntityId, TransitionId};
use entrepot_workflow::EntityStatus;

/// Audit row capturing one entity status change.
///
/// Transitions are append-only. The only permitted mutation of a past row
/// is setting `is_rolled_back` when a rollback targets it, and that happens
/// inside the ledger's atomic `append_rollback` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub entity_type: String,
    pub entity_id: EntityId,
    pub previous_status: EntityStatus,
    pub new_status: EntityStatus,
    pub occurred_at: DateTime<Utc>,
    pub actor: Actor,

    /// This row compensates an earlier transition.
    pub is_rollback: bool,

    /// An earlier row that a later rollback has reversed.
    pub is_rolled_back: bool,

    /// Back-reference to the transition this row reverses, if any.
    pub reverts: Option<TransitionId>,

    /// Operator-supplied reason (rollbacks carry one).
    pub reason: Option<String>,
}

impl Transition {
    /// Record a forward status change.
    pub fn record(
        entity_type: impl Into<String>,
        entity_id: EntityId,
        previous_status: EntityStatus,
        new_status: EntityStatus,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransitionId::new(),
            entity_type: entity_type.into(),
            entity_id,
            previous_status,
            new_status,
            occurred_at: now,
            actor,
            is_rollback: false,
            is_rolled_back: false,
            reverts: None,
            reason: None,
        }
    }
}
