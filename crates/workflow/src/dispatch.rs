//! Action dispatch planning and decision-outcome application.
//!
//! Both halves are pure: `plan_action` turns a matched rule into the
//! records to write, `apply_outcome` turns a human decision into the
//! updated records. The engine layer commits either atomically against the
//! stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entrepot_core::{Actor, EngineError, EngineResult, EntityId};
use entrepot_rules::{ActionKind, Rule};

use crate::decision::{Decision, DecisionStatus};
use crate::status::EntityStatus;

/// A planned entity status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: EntityStatus,
    pub to: EntityStatus,
}

/// Side assignment produced by tag/packaging rules. The tag and packaging
/// stores are collaborators; the plan only carries the assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    Tag(String),
    Package(String),
}

/// Everything a matched rule wants written, in one atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub decision: Decision,
    pub status_change: Option<StatusChange>,
    pub assignment: Option<Assignment>,
}

/// Outcome of a human decision on a pending validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Approved,
    Refused,
}

/// Plan the effect of a matched rule against the entity's current status.
///
/// Status-changing actions require the entity to still be in `Normal`;
/// anything else is a conflict the caller must resolve by re-fetching.
/// Advisory actions have no status precondition.
pub fn plan_action(
    entity_id: EntityId,
    current_status: EntityStatus,
    rule: &Rule,
    now: DateTime<Utc>,
) -> EngineResult<ActionPlan> {
    match &rule.action {
        ActionKind::Block => {
            ensure_dispatchable(entity_id, current_status)?;
            Ok(ActionPlan {
                decision: Decision::refused_by_rule(entity_id, rule.id, &rule.message, now),
                status_change: Some(StatusChange {
                    from: current_status,
                    to: EntityStatus::Blocked,
                }),
                assignment: None,
            })
        }
        ActionKind::RequireApproval => {
            ensure_dispatchable(entity_id, current_status)?;
            Ok(ActionPlan {
                decision: Decision::pending(
                    entity_id,
                    rule.id,
                    &rule.message,
                    rule.approvers.clone(),
                    now,
                ),
                status_change: Some(StatusChange {
                    from: current_status,
                    to: EntityStatus::PendingValidation,
                }),
                assignment: None,
            })
        }
        ActionKind::AlertOnly | ActionKind::ForceSelection { .. } => Ok(ActionPlan {
            decision: Decision::advisory(entity_id, rule.id, &rule.message, now),
            status_change: None,
            assignment: None,
        }),
        ActionKind::AssignTag { tag } => Ok(ActionPlan {
            decision: Decision::advisory(entity_id, rule.id, &rule.message, now),
            status_change: None,
            assignment: Some(Assignment::Tag(tag.clone())),
        }),
        ActionKind::AssignPackage { package } => Ok(ActionPlan {
            decision: Decision::advisory(entity_id, rule.id, &rule.message, now),
            status_change: None,
            assignment: Some(Assignment::Package(package.clone())),
        }),
    }
}

fn ensure_dispatchable(entity_id: EntityId, status: EntityStatus) -> EngineResult<()> {
    if status.is_dispatchable() {
        Ok(())
    } else {
        Err(EngineError::conflict(format!(
            "entity {entity_id} is in status '{status}', not dispatchable"
        )))
    }
}

/// Validate a decision outcome before any state mutation.
///
/// A refusal requires a non-empty comment; approval allows an empty one.
pub fn validate_outcome(outcome: DecisionOutcome, comment: &str) -> EngineResult<()> {
    if outcome == DecisionOutcome::Refused && comment.trim().is_empty() {
        return Err(EngineError::validation(
            "a refusal requires a non-empty comment",
        ));
    }
    Ok(())
}

/// Apply a human outcome to a pending decision.
///
/// Returns the updated decision record and the entity status it implies:
/// approved resumes the normal pipeline, refused cancels terminally. The
/// decision must still be pending; anything else is a conflict.
pub fn apply_outcome(
    decision: &Decision,
    outcome: DecisionOutcome,
    comment: &str,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<(Decision, EntityStatus)> {
    validate_outcome(outcome, comment)?;

    if !decision.is_pending() {
        return Err(EngineError::conflict(format!(
            "decision {} is no longer pending",
            decision.id
        )));
    }

    if let Some(user) = actor.user_id() {
        if !decision.allows_approver(user) {
            return Err(EngineError::Unauthorized);
        }
    }

    let mut updated = decision.clone();
    updated.decided_by = Some(actor);
    updated.decided_at = Some(now);
    updated.comment = if comment.trim().is_empty() {
        None
    } else {
        Some(comment.to_string())
    };

    let new_status = match outcome {
        DecisionOutcome::Approved => {
            updated.status = DecisionStatus::Approved;
            EntityStatus::Normal
        }
        DecisionOutcome::Refused => {
            updated.status = DecisionStatus::Refused;
            EntityStatus::Cancelled
        }
    };

    Ok((updated, new_status))
}
