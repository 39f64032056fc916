//! Rollback eligibility and compensating-record construction.

use chrono::{DateTime, Utc};

use entrepot_core::{Actor, EngineError, EngineResult};

use crate::transition::Transition;

/// Check whether a transition may be rolled back.
///
/// Rejected when the transition landed the entity in a terminal status,
/// when it is already flagged as rolled back, or when it is itself a
/// rollback record (rollbacks cannot be rolled back again). The ledger is
/// never touched on rejection.
pub fn check_eligibility(transition: &Transition) -> EngineResult<()> {
    if transition.is_rollback {
        return Err(EngineError::ineligible_rollback(format!(
            "transition {} is itself a rollback record",
            transition.id
        )));
    }

    if transition.is_rolled_back {
        return Err(EngineError::ineligible_rollback(format!(
            "transition {} is already rolled back",
            transition.id
        )));
    }

    if transition.new_status.is_terminal() {
        return Err(EngineError::ineligible_rollback(format!(
            "transition {} reached terminal status '{}'",
            transition.id, transition.new_status
        )));
    }

    Ok(())
}

/// Build the compensating record for an eligible transition.
///
/// The compensating record reverses the status change (entity reverts to
/// the original's `previous_status`) and back-references the original. It
/// must be committed through `TransitionLedger::append_rollback`, which
/// flags the original in the same atomic operation.
pub fn plan_rollback(
    original: &Transition,
    reason: impl Into<String>,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<Transition> {
    check_eligibility(original)?;

    let mut compensating = Transition::record(
        original.entity_type.clone(),
        original.entity_id,
        original.new_status,
        original.previous_status,
        actor,
        now,
    );
    compensating.is_rollback = true;
    compensating.reverts = Some(original.id);
    compensating.reason = Some(reason.into());
    Ok(compensating)
}
