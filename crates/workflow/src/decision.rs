//! Decision/validation audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entrepot_core::{Actor, DecisionId, EntityId, RuleId, UserId};

/// Outcome state of a decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Pending,
    Approved,
    Refused,
}

/// Audit row capturing a rule-triggered or human approval/refusal outcome.
///
/// Invariant (enforced by the engine at planning time): at most one
/// *pending* decision per entity at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    pub entity_id: EntityId,
    pub rule_id: RuleId,
    pub status: DecisionStatus,

    /// Blocking reason, taken from the rule's operator-facing message.
    pub reason: String,

    /// Advisory decisions record observability only; nothing awaits them.
    pub advisory: bool,

    /// Users allowed to decide this record. Empty = any authorized user.
    pub approvers: Vec<UserId>,

    pub requested_by: Actor,
    pub requested_at: DateTime<Utc>,

    pub decided_by: Option<Actor>,
    pub decided_at: Option<DateTime<Utc>>,

    /// Free-text decision comment. Mandatory on refusal.
    pub comment: Option<String>,
}

impl Decision {
    /// A pending approval request, written by a require-approval action.
    pub fn pending(
        entity_id: EntityId,
        rule_id: RuleId,
        reason: impl Into<String>,
        approvers: Vec<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DecisionId::new(),
            entity_id,
            rule_id,
            status: DecisionStatus::Pending,
            reason: reason.into(),
            advisory: false,
            approvers,
            requested_by: Actor::System,
            requested_at: now,
            decided_by: None,
            decided_at: None,
            comment: None,
        }
    }

    /// An immediate refusal written by a block action. No approval step.
    pub fn refused_by_rule(
        entity_id: EntityId,
        rule_id: RuleId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DecisionId::new(),
            entity_id,
            rule_id,
            status: DecisionStatus::Refused,
            reason: reason.into(),
            advisory: false,
            approvers: Vec::new(),
            requested_by: Actor::System,
            requested_at: now,
            decided_by: Some(Actor::System),
            decided_at: Some(now),
            comment: None,
        }
    }

    /// An advisory record (alert-only, tag/packaging assignment, forced
    /// selection). Auto-closed at creation; purely for observability.
    pub fn advisory(
        entity_id: EntityId,
        rule_id: RuleId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DecisionId::new(),
            entity_id,
            rule_id,
            status: DecisionStatus::Approved,
            reason: reason.into(),
            advisory: true,
            approvers: Vec::new(),
            requested_by: Actor::System,
            requested_at: now,
            decided_by: Some(Actor::System),
            decided_at: Some(now),
            comment: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DecisionStatus::Pending
    }

    /// Whether `user` may decide this record.
    pub fn allows_approver(&self, user: UserId) -> bool {
        self.approvers.is_empty() || self.approvers.contains(&user)
    }
}
