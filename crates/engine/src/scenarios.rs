//! End-to-end tests through the full engine: stores, rule evaluation,
//! decisions, ledger and notifications wired together in memory.

use std::sync::Arc;

use serde_json::{Value, json};

use entrepot_auth::{Permission, Principal, Role, TenantMembership};
use entrepot_core::{EngineError, EntityId, EntitySnapshot, RuleId, UserId};
use entrepot_ledger::{InMemoryTransitionLedger, TransitionLedger};
use entrepot_rules::{ActionKind, Condition, Operator, Rule, RuleScope};
use entrepot_scoring::Candidate;
use entrepot_workflow::{Assignment, DecisionOutcome, DecisionStatus, EntityStatus};

use crate::notify::{NotificationKind, RecordingSink};
use crate::service::EngineService;
use crate::store::{
    DecisionStore, EntityRecord, EntityStore, InMemoryDecisionStore, InMemoryEntityStore,
    InMemoryRuleStore,
};

type Service = EngineService<
    Arc<InMemoryEntityStore>,
    Arc<InMemoryRuleStore>,
    Arc<InMemoryDecisionStore>,
    Arc<InMemoryTransitionLedger>,
>;

struct Harness {
    entities: Arc<InMemoryEntityStore>,
    rules: Arc<InMemoryRuleStore>,
    decisions: Arc<InMemoryDecisionStore>,
    ledger: Arc<InMemoryTransitionLedger>,
    sink: Arc<RecordingSink>,
    service: Service,
}

fn harness() -> Harness {
    let entities = Arc::new(InMemoryEntityStore::new());
    let rules = Arc::new(InMemoryRuleStore::new());
    let decisions = Arc::new(InMemoryDecisionStore::new());
    let ledger = Arc::new(InMemoryTransitionLedger::new());
    let sink = Arc::new(RecordingSink::new());

    let service = EngineService::new(
        entities.clone(),
        rules.clone(),
        decisions.clone(),
        ledger.clone(),
    )
    .with_notifier(sink.clone());

    Harness {
        entities,
        rules,
        decisions,
        ledger,
        sink,
        service,
    }
}

fn order(fields: Value) -> EntitySnapshot {
    let Value::Object(map) = fields else {
        panic!("test fields must be a JSON object");
    };
    EntitySnapshot::new("order", EntityId::new(), map)
}

fn seed_order(h: &Harness, fields: Value) -> EntityId {
    let snapshot = order(fields);
    let entity_id = snapshot.entity_id();
    h.entities.put(EntityRecord::new(snapshot));
    entity_id
}

fn principal_with(permissions: Vec<Permission>) -> Principal {
    let tenant_id = entrepot_core::TenantId::new();
    Principal {
        user_id: UserId::new(),
        active_tenant_id: tenant_id,
        membership: TenantMembership {
            tenant_id,
            roles: vec![Role::new("supervisor")],
            permissions,
        },
    }
}

fn approver() -> Principal {
    principal_with(vec![Permission::validation_decide()])
}

fn rollback_operator() -> Principal {
    principal_with(vec![Permission::ledger_rollback()])
}

fn high_value_rule() -> Rule {
    Rule::new(RuleId::new(), RuleScope::Global, ActionKind::RequireApproval, 1)
        .with_conditions(vec![Condition::new(
            "valeur_totale",
            Operator::GreaterThan,
            json!(3000),
        )])
        .with_message("high-value order, approval required")
}

#[test]
fn high_value_order_is_parked_for_approval() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));

    let outcome = h.service.evaluate(entity_id).unwrap();

    assert_eq!(outcome.action, Some(ActionKind::RequireApproval));
    assert_eq!(outcome.new_status, Some(EntityStatus::PendingValidation));

    let record = h.entities.fetch(entity_id).unwrap();
    assert_eq!(record.status, EntityStatus::PendingValidation);
    assert_eq!(record.pending_decision, outcome.decision_id);

    let rows = h.ledger.for_entity("order", entity_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].previous_status, EntityStatus::Normal);
    assert_eq!(rows[0].new_status, EntityStatus::PendingValidation);

    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, NotificationKind::ValidationRequested);
}

#[test]
fn a_second_approval_request_is_a_conflict_not_a_queue() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));

    h.service.evaluate(entity_id).unwrap();
    let err = h.service.evaluate(entity_id).unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // Still exactly one decision and one transition.
    assert_eq!(h.decisions.for_entity(entity_id).len(), 1);
    assert_eq!(h.ledger.for_entity("order", entity_id).unwrap().len(), 1);
}

#[test]
fn below_threshold_order_passes_untouched() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 1200 }));

    let outcome = h.service.evaluate(entity_id).unwrap();
    assert!(outcome.rule_applied.is_none());
    assert_eq!(
        h.entities.fetch(entity_id).unwrap().status,
        EntityStatus::Normal
    );
    assert!(h.ledger.is_empty());
    assert!(h.sink.delivered().is_empty());
}

#[test]
fn approval_resumes_the_normal_pipeline() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));

    let outcome = h.service.evaluate(entity_id).unwrap();
    let decision_id = outcome.decision_id.unwrap();

    let resolution = h
        .service
        .decide(decision_id, DecisionOutcome::Approved, "", &approver())
        .unwrap();

    assert_eq!(resolution.new_status, EntityStatus::Normal);
    let record = h.entities.fetch(entity_id).unwrap();
    assert_eq!(record.status, EntityStatus::Normal);
    assert!(record.pending_decision.is_none());

    let decision = h.decisions.get(decision_id).unwrap();
    assert_eq!(decision.status, DecisionStatus::Approved);

    assert_eq!(h.ledger.for_entity("order", entity_id).unwrap().len(), 2);
}

#[test]
fn refusal_without_comment_changes_nothing() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let decision_id = h.service.evaluate(entity_id).unwrap().decision_id.unwrap();

    let err = h
        .service
        .decide(decision_id, DecisionOutcome::Refused, "  ", &approver())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Entity and decision untouched, no extra ledger row.
    let record = h.entities.fetch(entity_id).unwrap();
    assert_eq!(record.status, EntityStatus::PendingValidation);
    assert!(h.decisions.get(decision_id).unwrap().is_pending());
    assert_eq!(h.ledger.for_entity("order", entity_id).unwrap().len(), 1);
}

#[test]
fn refusal_with_comment_cancels_terminally() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let decision_id = h.service.evaluate(entity_id).unwrap().decision_id.unwrap();

    let resolution = h
        .service
        .decide(
            decision_id,
            DecisionOutcome::Refused,
            "incoherent delivery address",
            &approver(),
        )
        .unwrap();

    assert_eq!(resolution.new_status, EntityStatus::Cancelled);
    let decision = h.decisions.get(decision_id).unwrap();
    assert_eq!(decision.status, DecisionStatus::Refused);
    assert_eq!(
        decision.comment.as_deref(),
        Some("incoherent delivery address")
    );
}

#[test]
fn deciding_without_the_permission_is_unauthorized() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let decision_id = h.service.evaluate(entity_id).unwrap().decision_id.unwrap();

    let err = h
        .service
        .decide(
            decision_id,
            DecisionOutcome::Approved,
            "",
            &principal_with(vec![]),
        )
        .unwrap_err();
    assert_eq!(err, EngineError::Unauthorized);
    assert!(h.decisions.get(decision_id).unwrap().is_pending());
}

#[test]
fn deciding_twice_is_a_conflict() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let decision_id = h.service.evaluate(entity_id).unwrap().decision_id.unwrap();

    h.service
        .decide(decision_id, DecisionOutcome::Approved, "", &approver())
        .unwrap();
    let err = h
        .service
        .decide(decision_id, DecisionOutcome::Approved, "", &approver())
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[test]
fn sanctioned_destination_is_blocked_outright() {
    let h = harness();
    h.rules.put(
        Rule::new(RuleId::new(), RuleScope::Global, ActionKind::Block, 0)
            .with_conditions(vec![Condition::new(
                "pays_destination",
                Operator::In,
                json!(["KP", "IR"]),
            )])
            .with_message("sanctioned destination"),
    );
    let entity_id = seed_order(&h, json!({ "pays_destination": "KP" }));

    let outcome = h.service.evaluate(entity_id).unwrap();
    assert_eq!(outcome.new_status, Some(EntityStatus::Blocked));

    let record = h.entities.fetch(entity_id).unwrap();
    assert_eq!(record.status, EntityStatus::Blocked);
    assert!(record.pending_decision.is_none());

    let decisions = h.decisions.for_entity(entity_id);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].status, DecisionStatus::Refused);
    assert!(!decisions[0].advisory);

    assert_eq!(h.sink.delivered()[0].kind, NotificationKind::EntityBlocked);

    // A blocked entity is no longer dispatchable.
    let err = h.service.evaluate(entity_id).unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[test]
fn first_match_wins_across_actions() {
    let h = harness();
    h.rules.put(
        Rule::new(RuleId::new(), RuleScope::Global, ActionKind::AlertOnly, 5)
            .with_conditions(vec![Condition::new(
                "valeur_totale",
                Operator::GreaterThan,
                json!(100),
            )])
            .with_message("notable order"),
    );
    h.rules.put(high_value_rule()); // priority 1

    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let outcome = h.service.evaluate(entity_id).unwrap();

    // Only the priority-1 rule fires; the alert never does.
    assert_eq!(outcome.action, Some(ActionKind::RequireApproval));
    assert_eq!(h.decisions.for_entity(entity_id).len(), 1);
}

#[test]
fn tag_assignment_is_advisory_only() {
    let h = harness();
    h.rules.put(
        Rule::new(
            RuleId::new(),
            RuleScope::Global,
            ActionKind::AssignTag {
                tag: "fragile".to_string(),
            },
            1,
        )
        .with_conditions(vec![Condition::new(
            "contient_verre",
            Operator::Equals,
            json!(true),
        )])
        .with_message("glassware: fragile handling"),
    );
    let entity_id = seed_order(&h, json!({ "contient_verre": true }));

    let outcome = h.service.evaluate(entity_id).unwrap();

    assert_eq!(
        outcome.assignment,
        Some(Assignment::Tag("fragile".to_string()))
    );
    assert!(outcome.new_status.is_none());
    assert_eq!(
        h.entities.fetch(entity_id).unwrap().status,
        EntityStatus::Normal
    );
    assert!(h.ledger.is_empty());

    let decisions = h.decisions.for_entity(entity_id);
    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].advisory);
}

#[test]
fn rollback_restores_the_previous_status() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let decision_id = h.service.evaluate(entity_id).unwrap().decision_id.unwrap();

    let original = h.ledger.for_entity("order", entity_id).unwrap()[0].clone();
    let receipt = h
        .service
        .rollback(original.id, "rule misconfigured", &rollback_operator())
        .unwrap();

    assert_eq!(receipt.restored_status, EntityStatus::Normal);

    let record = h.entities.fetch(entity_id).unwrap();
    assert_eq!(record.status, EntityStatus::Normal);
    assert!(record.pending_decision.is_none());

    let rows = h.ledger.for_entity("order", entity_id).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(h.ledger.get(original.id).unwrap().is_rolled_back);
    assert_eq!(rows[1].reverts, Some(original.id));
    assert_eq!(rows[1].reason.as_deref(), Some("rule misconfigured"));

    // The orphaned pending decision was closed with the rollback reason.
    let decision = h.decisions.get(decision_id).unwrap();
    assert_eq!(decision.status, DecisionStatus::Refused);
    assert_eq!(decision.comment.as_deref(), Some("rolled back: rule misconfigured"));
}

#[test]
fn a_transition_cannot_be_rolled_back_twice() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    h.service.evaluate(entity_id).unwrap();

    let original = h.ledger.for_entity("order", entity_id).unwrap()[0].clone();
    let operator = rollback_operator();
    h.service
        .rollback(original.id, "first", &operator)
        .unwrap();

    let err = h
        .service
        .rollback(original.id, "second", &operator)
        .unwrap_err();
    assert!(matches!(err, EngineError::IneligibleRollback(_)));
    assert_eq!(h.ledger.for_entity("order", entity_id).unwrap().len(), 2);
}

#[test]
fn terminal_transitions_are_not_rollback_eligible() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    let decision_id = h.service.evaluate(entity_id).unwrap().decision_id.unwrap();
    h.service
        .decide(decision_id, DecisionOutcome::Refused, "bad order", &approver())
        .unwrap();

    // The refusal transition landed in Cancelled, a terminal status.
    let rows = h.ledger.for_entity("order", entity_id).unwrap();
    let refusal = rows.last().unwrap().clone();
    assert_eq!(refusal.new_status, EntityStatus::Cancelled);

    let err = h
        .service
        .rollback(refusal.id, "changed my mind", &rollback_operator())
        .unwrap_err();
    assert!(matches!(err, EngineError::IneligibleRollback(_)));
}

#[test]
fn rollback_requires_the_ledger_permission() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    h.service.evaluate(entity_id).unwrap();

    let original = h.ledger.for_entity("order", entity_id).unwrap()[0].clone();
    let err = h
        .service
        .rollback(original.id, "reason", &approver())
        .unwrap_err();
    assert_eq!(err, EngineError::Unauthorized);
    assert_eq!(h.ledger.for_entity("order", entity_id).unwrap().len(), 1);
}

#[test]
fn rollback_requires_a_reason() {
    let h = harness();
    h.rules.put(high_value_rule());
    let entity_id = seed_order(&h, json!({ "valeur_totale": 5000 }));
    h.service.evaluate(entity_id).unwrap();

    let original = h.ledger.for_entity("order", entity_id).unwrap()[0].clone();
    let err = h
        .service
        .rollback(original.id, "   ", &rollback_operator())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn forced_selection_dominates_scoring() {
    let h = harness();
    let rule_id = RuleId::new();
    h.rules.put(
        Rule::new(
            rule_id,
            RuleScope::Global,
            ActionKind::ForceSelection {
                candidate: "mondial-relay".to_string(),
            },
            1,
        )
        .with_conditions(vec![Condition::new(
            "client.segment",
            Operator::Equals,
            json!("eco"),
        )])
        .with_message("eco segment ships via relay points"),
    );
    let entity_id = seed_order(&h, json!({ "client": { "segment": "eco" } }));

    let candidates = vec![
        Candidate::new("chronopost")
            .with_success_rate(0.99)
            .with_avg_delay_hours(24.0)
            .with_cost_cents(1200),
        Candidate::new("mondial-relay")
            .with_success_rate(0.85)
            .with_avg_delay_hours(96.0)
            .with_cost_cents(400),
    ];

    let outcome = h.service.select_candidate(entity_id, &candidates).unwrap();
    assert_eq!(outcome.chosen.candidate.id, "mondial-relay");
    assert_eq!(outcome.forced_by, Some(rule_id));

    // The forced pick left an advisory decision behind.
    let decisions = h.decisions.for_entity(entity_id);
    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].advisory);
    assert_eq!(decisions[0].rule_id, rule_id);
}

#[test]
fn missing_forced_candidate_falls_back_to_scoring() {
    let h = harness();
    h.rules.put(
        Rule::new(
            RuleId::new(),
            RuleScope::Global,
            ActionKind::ForceSelection {
                candidate: "defunct-carrier".to_string(),
            },
            1,
        )
        .with_conditions(vec![Condition::new(
            "client.segment",
            Operator::Equals,
            json!("eco"),
        )])
        .with_message("stale carrier configuration"),
    );
    let entity_id = seed_order(&h, json!({ "client": { "segment": "eco" } }));

    let candidates = vec![
        Candidate::new("a").with_success_rate(0.9).with_cost_cents(500),
        Candidate::new("b").with_success_rate(0.8).with_cost_cents(500),
    ];

    let outcome = h.service.select_candidate(entity_id, &candidates).unwrap();
    assert!(outcome.forced_by.is_none());
    assert_eq!(outcome.chosen.candidate.id, "a");
    assert!(h.decisions.for_entity(entity_id).is_empty());
}

#[test]
fn tenant_scoped_rules_do_not_leak_across_tenants() {
    let h = harness();
    let tenant = entrepot_core::TenantId::new();
    h.rules.put(
        Rule::new(RuleId::new(), RuleScope::Tenant(tenant), ActionKind::Block, 1)
            .with_conditions(vec![Condition::new(
                "valeur_totale",
                Operator::GreaterThan,
                json!(0),
            )])
            .with_message("tenant-specific hold"),
    );

    // An entity from another tenant never sees the rule.
    let snapshot = order(json!({ "valeur_totale": 100 }))
        .with_tenant(entrepot_core::TenantId::new());
    let entity_id = snapshot.entity_id();
    h.entities.put(EntityRecord::new(snapshot));

    let outcome = h.service.evaluate(entity_id).unwrap();
    assert!(outcome.rule_applied.is_none());

    // An entity from the owning tenant does.
    let snapshot = order(json!({ "valeur_totale": 100 })).with_tenant(tenant);
    let entity_id = snapshot.entity_id();
    h.entities.put(EntityRecord::new(snapshot));

    let outcome = h.service.evaluate(entity_id).unwrap();
    assert_eq!(outcome.action, Some(ActionKind::Block));
}

#[test]
fn evaluating_a_missing_entity_is_not_found() {
    let h = harness();
    let err = h.service.evaluate(EntityId::new()).unwrap_err();
    assert_eq!(err, EngineError::NotFound);
}
