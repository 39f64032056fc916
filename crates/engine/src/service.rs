//! Decision engine orchestration.
//!
//! `EngineService` composes the storage traits with the pure domain
//! crates. The execution model is consistent across operations:
//!
//! 1. Read entity state and applicable rules
//! 2. Plan the effect with pure functions (no mutation yet)
//! 3. Commit through the entity store's optimistic precondition
//! 4. Append the audit rows (decisions, transitions)
//! 5. Notify, fire-and-forget
//!
//! A conflict at step 3 means another writer got there first; the caller
//! must re-fetch and retry explicitly. In a persistent deployment steps
//! 3–4 belong to one transaction.

use std::sync::Arc;

use chrono::Utc;

use entrepot_auth::{Permission, Principal, authorize};
use entrepot_core::{
    Actor, DecisionId, EngineError, EngineResult, EntityId, RuleId, TransitionId,
};
use entrepot_ledger::{LedgerError, Transition, TransitionLedger, plan_rollback};
use entrepot_rules::{ActionKind, Rule, match_first};
use entrepot_scoring::{
    Candidate, ForcedChoice, NarrativeService, ScoreWeights, SelectionOutcome, select,
};
use entrepot_workflow::{
    Assignment, Decision, DecisionOutcome, DecisionStatus, EntityStatus, apply_outcome,
    plan_action,
};

use crate::notify::{LogSink, Notification, NotificationKind, NotificationSink};
use crate::store::{DecisionStore, EntityStore, RuleStore, StatusExpectation};

fn ledger_error(err: LedgerError) -> EngineError {
    match err {
        LedgerError::NotFound(_) => EngineError::NotFound,
        LedgerError::Conflict(msg) => EngineError::conflict(msg),
        LedgerError::InvalidAppend(msg) => EngineError::conflict(msg),
    }
}

/// Result of one evaluation sweep over an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    /// The winning rule, if any matched.
    pub rule_applied: Option<RuleId>,
    pub action: Option<ActionKind>,
    /// Status the entity moved to, when the action changed it.
    pub new_status: Option<EntityStatus>,
    /// The decision record written for the winning rule.
    pub decision_id: Option<DecisionId>,
    /// Tag or packaging assignment carried by an advisory action.
    pub assignment: Option<Assignment>,
}

impl EvaluationOutcome {
    fn no_match() -> Self {
        Self {
            rule_applied: None,
            action: None,
            new_status: None,
            decision_id: None,
            assignment: None,
        }
    }
}

/// Result of applying a human outcome to a pending decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionResolution {
    pub decision_id: DecisionId,
    pub new_status: EntityStatus,
}

/// Result of a committed rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollbackReceipt {
    /// The compensating transition appended to the ledger.
    pub compensating: TransitionId,
    pub restored_status: EntityStatus,
}

/// The decision engine: rule evaluation, validation decisions, rollbacks
/// and candidate selection against pluggable stores.
pub struct EngineService<E, R, D, L> {
    entities: E,
    rules: R,
    decisions: D,
    ledger: L,
    notifier: Arc<dyn NotificationSink>,
    narrative: Option<Arc<dyn NarrativeService>>,
    weights: ScoreWeights,
}

impl<E, R, D, L> EngineService<E, R, D, L>
where
    E: EntityStore,
    R: RuleStore,
    D: DecisionStore,
    L: TransitionLedger,
{
    pub fn new(entities: E, rules: R, decisions: D, ledger: L) -> Self {
        Self {
            entities,
            rules,
            decisions,
            ledger,
            notifier: Arc::new(LogSink),
            narrative: None,
            weights: ScoreWeights::default(),
        }
    }

    pub fn with_notifier(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifier = sink;
        self
    }

    pub fn with_narrative(mut self, service: Arc<dyn NarrativeService>) -> Self {
        self.narrative = Some(service);
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Evaluate the rule set against an entity and apply the winning
    /// rule's action.
    ///
    /// First-match-wins: only the highest-priority matching rule takes
    /// effect. At most one pending decision may exist per entity; a second
    /// approval request is a conflict, not a queue.
    pub fn evaluate(&self, entity_id: EntityId) -> EngineResult<EvaluationOutcome> {
        let record = self.entities.fetch(entity_id)?;
        let rules = self.rules.applicable_rules(record.snapshot.tenant_id())?;

        let Some(rule) = match_first(&record.snapshot, &rules) else {
            tracing::debug!(%entity_id, "no rule matched");
            return Ok(EvaluationOutcome::no_match());
        };

        if !rule.action.is_advisory()
            && self.decisions.pending_for_entity(entity_id)?.is_some()
        {
            return Err(EngineError::conflict(format!(
                "entity {entity_id} already has a pending decision"
            )));
        }

        let now = Utc::now();
        let plan = plan_action(entity_id, record.status, rule, now)?;

        let new_status = plan.status_change.map(|c| c.to);
        if let Some(change) = plan.status_change {
            let pending = plan.decision.is_pending().then_some(plan.decision.id);
            self.entities.update_status(
                entity_id,
                StatusExpectation {
                    status: record.status,
                    pending_decision: record.pending_decision,
                },
                change.to,
                pending,
            )?;
            self.ledger
                .append(Transition::record(
                    record.snapshot.entity_type(),
                    entity_id,
                    change.from,
                    change.to,
                    Actor::System,
                    now,
                ))
                .map_err(ledger_error)?;
        }

        let decision_id = plan.decision.id;
        self.decisions.insert(plan.decision.clone())?;

        self.notify_action(entity_id, rule);
        tracing::info!(
            %entity_id,
            rule_id = %rule.id,
            action = rule.action.name(),
            "rule applied"
        );

        Ok(EvaluationOutcome {
            rule_applied: Some(rule.id),
            action: Some(rule.action.clone()),
            new_status,
            decision_id: Some(decision_id),
            assignment: plan.assignment,
        })
    }

    /// Apply a human approval/refusal to a pending decision.
    ///
    /// The entity must still be in pending validation and referencing this
    /// exact decision; anything else is a conflict. Approval resumes the
    /// normal pipeline, refusal cancels terminally.
    pub fn decide(
        &self,
        decision_id: DecisionId,
        outcome: DecisionOutcome,
        comment: &str,
        principal: &Principal,
    ) -> EngineResult<DecisionResolution> {
        authorize(principal, &Permission::validation_decide())
            .map_err(|_| EngineError::Unauthorized)?;
        let actor = Actor::User(principal.user_id);

        let decision = self.decisions.get(decision_id)?;
        let now = Utc::now();
        let (updated, new_status) = apply_outcome(&decision, outcome, comment, actor, now)?;

        let record = self.entities.fetch(decision.entity_id)?;
        if record.status != EntityStatus::PendingValidation
            || record.pending_decision != Some(decision_id)
        {
            return Err(EngineError::conflict(format!(
                "entity {} is not awaiting decision {decision_id}",
                decision.entity_id
            )));
        }

        self.entities.update_status(
            decision.entity_id,
            StatusExpectation {
                status: EntityStatus::PendingValidation,
                pending_decision: Some(decision_id),
            },
            new_status,
            None,
        )?;
        self.decisions.update(updated)?;
        self.ledger
            .append(Transition::record(
                record.snapshot.entity_type(),
                decision.entity_id,
                EntityStatus::PendingValidation,
                new_status,
                actor,
                now,
            ))
            .map_err(ledger_error)?;

        self.notifier.deliver(Notification {
            kind: NotificationKind::DecisionSettled,
            entity_id: decision.entity_id,
            rule_id: Some(decision.rule_id),
            message: decision.reason.clone(),
        });
        tracing::info!(
            %decision_id,
            entity_id = %decision.entity_id,
            new_status = %new_status,
            "decision settled"
        );

        Ok(DecisionResolution {
            decision_id,
            new_status,
        })
    }

    /// Roll back a committed transition.
    ///
    /// Requires the `ledger.rollback` permission and a non-empty reason.
    /// The entity must still sit in the status the transition put it in;
    /// the compensating row and the flag on the original commit together.
    /// A pending decision left behind by the reverted transition is closed
    /// as refused, carrying the rollback reason.
    pub fn rollback(
        &self,
        transition_id: TransitionId,
        reason: &str,
        principal: &Principal,
    ) -> EngineResult<RollbackReceipt> {
        authorize(principal, &Permission::ledger_rollback())
            .map_err(|_| EngineError::Unauthorized)?;

        if reason.trim().is_empty() {
            return Err(EngineError::validation(
                "a rollback requires a non-empty reason",
            ));
        }

        let original = self.ledger.get(transition_id).map_err(ledger_error)?;
        let now = Utc::now();
        let actor = Actor::User(principal.user_id);
        let compensating = plan_rollback(&original, reason, actor, now)?;

        let record = self.entities.fetch(original.entity_id)?;
        if record.status != original.new_status {
            return Err(EngineError::conflict(format!(
                "entity {} moved to '{}' since transition {transition_id}",
                original.entity_id, record.status
            )));
        }

        // Revert the entity first under its optimistic precondition, then
        // commit the ledger pair. A racing rollback on the same original
        // loses either at the status write or at the already-rolled-back
        // flag.
        self.entities.update_status(
            original.entity_id,
            StatusExpectation {
                status: record.status,
                pending_decision: record.pending_decision,
            },
            original.previous_status,
            None,
        )?;
        let committed = self
            .ledger
            .append_rollback(original.id, compensating)
            .map_err(ledger_error)?;

        if let Some(pending_id) = record.pending_decision {
            self.close_orphaned_decision(pending_id, reason, actor);
        }

        self.notifier.deliver(Notification {
            kind: NotificationKind::RollbackApplied,
            entity_id: original.entity_id,
            rule_id: None,
            message: reason.to_string(),
        });
        tracing::info!(
            %transition_id,
            entity_id = %original.entity_id,
            restored_status = %original.previous_status,
            "transition rolled back"
        );

        Ok(RollbackReceipt {
            compensating: committed.id,
            restored_status: original.previous_status,
        })
    }

    /// Choose a carrier candidate for an entity.
    ///
    /// A matching force-selection rule dominates the score ranking; the
    /// forced pick is recorded as an advisory decision. Narrative
    /// generation is best-effort and never fails the selection.
    pub fn select_candidate(
        &self,
        entity_id: EntityId,
        candidates: &[Candidate],
    ) -> EngineResult<SelectionOutcome> {
        let record = self.entities.fetch(entity_id)?;
        let rules = self.rules.applicable_rules(record.snapshot.tenant_id())?;

        // First-match-wins applies here too: a forced choice only comes
        // from the winning rule, not from any force-selection rule that
        // happens to match further down the order.
        let winner = match_first(&record.snapshot, &rules);
        let forced = winner.and_then(|rule| match &rule.action {
            ActionKind::ForceSelection { candidate } => Some(ForcedChoice {
                rule_id: rule.id,
                candidate: candidate.clone(),
            }),
            _ => None,
        });

        let outcome = select(
            candidates,
            forced,
            &self.weights,
            self.narrative.as_deref(),
        )?;

        if let Some(rule_id) = outcome.forced_by {
            if let Some(rule) = rules.iter().find(|r| r.id == rule_id) {
                self.record_forced_selection(entity_id, rule);
            }
        }

        Ok(outcome)
    }

    fn notify_action(&self, entity_id: EntityId, rule: &Rule) {
        let kind = match &rule.action {
            ActionKind::Block => NotificationKind::EntityBlocked,
            ActionKind::RequireApproval => NotificationKind::ValidationRequested,
            _ => NotificationKind::Alert,
        };
        self.notifier.deliver(Notification {
            kind,
            entity_id,
            rule_id: Some(rule.id),
            message: rule.message.clone(),
        });
    }

    fn record_forced_selection(&self, entity_id: EntityId, rule: &Rule) {
        let advisory = Decision::advisory(entity_id, rule.id, &rule.message, Utc::now());
        if let Err(err) = self.decisions.insert(advisory) {
            tracing::warn!(rule_id = %rule.id, %err, "could not record forced-selection decision");
        }
        self.notifier.deliver(Notification {
            kind: NotificationKind::Alert,
            entity_id,
            rule_id: Some(rule.id),
            message: rule.message.clone(),
        });
    }

    /// Best-effort cleanup: a rollback that reverted an entity out of
    /// pending validation leaves its decision record with nothing to wait
    /// for. Close it as refused so it cannot be decided later.
    fn close_orphaned_decision(&self, decision_id: DecisionId, reason: &str, actor: Actor) {
        let Ok(decision) = self.decisions.get(decision_id) else {
            return;
        };
        if !decision.is_pending() {
            return;
        }

        let mut closed = decision;
        closed.status = DecisionStatus::Refused;
        closed.decided_by = Some(actor);
        closed.decided_at = Some(Utc::now());
        closed.comment = Some(format!("rolled back: {reason}"));
        if let Err(err) = self.decisions.update(closed) {
            tracing::warn!(%decision_id, %err, "could not close orphaned pending decision");
        }
    }
}
