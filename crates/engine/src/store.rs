//! Storage abstractions the engine composes.
//!
//! Traits keep the orchestration testable with in-memory implementations
//! and swappable with real backends. The entity store is the single
//! optimistic-concurrency gate: every status-changing commit states the
//! state it read, and the store rejects the write if that state is stale.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use entrepot_core::{DecisionId, EngineError, EntityId, EntitySnapshot, TenantId};
use entrepot_rules::Rule;
use entrepot_workflow::{Decision, EntityStatus};

/// Store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => EngineError::NotFound,
            StoreError::Conflict(msg) => EngineError::conflict(msg),
        }
    }
}

/// An entity as the engine reads it: snapshot, lifecycle status, and the
/// pending decision currently gating it (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub snapshot: EntitySnapshot,
    pub status: EntityStatus,
    pub pending_decision: Option<DecisionId>,
}

impl EntityRecord {
    /// A freshly created entity in the normal pipeline.
    pub fn new(snapshot: EntitySnapshot) -> Self {
        Self {
            snapshot,
            status: EntityStatus::Normal,
            pending_decision: None,
        }
    }

    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = status;
        self
    }
}

/// The state a caller read before planning a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusExpectation {
    pub status: EntityStatus,
    pub pending_decision: Option<DecisionId>,
}

/// Entity state storage.
pub trait EntityStore: Send + Sync {
    fn fetch(&self, entity_id: EntityId) -> Result<EntityRecord, StoreError>;

    /// Conditionally move the entity to a new status.
    ///
    /// The write applies only if the stored status and pending-decision
    /// reference still match `expected`; otherwise the store returns a
    /// conflict and the caller must re-fetch. The snapshot itself is never
    /// touched here.
    fn update_status(
        &self,
        entity_id: EntityId,
        expected: StatusExpectation,
        new_status: EntityStatus,
        pending_decision: Option<DecisionId>,
    ) -> Result<(), StoreError>;
}

impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    fn fetch(&self, entity_id: EntityId) -> Result<EntityRecord, StoreError> {
        (**self).fetch(entity_id)
    }

    fn update_status(
        &self,
        entity_id: EntityId,
        expected: StatusExpectation,
        new_status: EntityStatus,
        pending_decision: Option<DecisionId>,
    ) -> Result<(), StoreError> {
        (**self).update_status(entity_id, expected, new_status, pending_decision)
    }
}

/// Rule configuration storage.
pub trait RuleStore: Send + Sync {
    /// Rules whose scope covers the given tenant (global rules included).
    ///
    /// Activity and structural validity are the matcher's concern; the
    /// store only filters on scope.
    fn applicable_rules(&self, tenant: Option<TenantId>) -> Result<Vec<Rule>, StoreError>;
}

impl<S> RuleStore for Arc<S>
where
    S: RuleStore + ?Sized,
{
    fn applicable_rules(&self, tenant: Option<TenantId>) -> Result<Vec<Rule>, StoreError> {
        (**self).applicable_rules(tenant)
    }
}

/// Decision record storage.
pub trait DecisionStore: Send + Sync {
    fn insert(&self, decision: Decision) -> Result<(), StoreError>;

    fn get(&self, id: DecisionId) -> Result<Decision, StoreError>;

    /// Replace a stored decision (same id) after an outcome was applied.
    fn update(&self, decision: Decision) -> Result<(), StoreError>;

    /// The pending decision for an entity, if one exists.
    fn pending_for_entity(&self, entity_id: EntityId) -> Result<Option<Decision>, StoreError>;
}

impl<S> DecisionStore for Arc<S>
where
    S: DecisionStore + ?Sized,
{
    fn insert(&self, decision: Decision) -> Result<(), StoreError> {
        (**self).insert(decision)
    }

    fn get(&self, id: DecisionId) -> Result<Decision, StoreError> {
        (**self).get(id)
    }

    fn update(&self, decision: Decision) -> Result<(), StoreError> {
        (**self).update(decision)
    }

    fn pending_for_entity(&self, entity_id: EntityId) -> Result<Option<Decision>, StoreError> {
        (**self).pending_for_entity(entity_id)
    }
}

fn poisoned() -> StoreError {
    StoreError::Conflict("lock poisoned".to_string())
}

/// In-memory entity store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    records: RwLock<HashMap<EntityId, EntityRecord>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, record: EntityRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert(record.snapshot.entity_id(), record);
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    fn fetch(&self, entity_id: EntityId) -> Result<EntityRecord, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        records.get(&entity_id).cloned().ok_or(StoreError::NotFound)
    }

    fn update_status(
        &self,
        entity_id: EntityId,
        expected: StatusExpectation,
        new_status: EntityStatus,
        pending_decision: Option<DecisionId>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records.get_mut(&entity_id).ok_or(StoreError::NotFound)?;

        if record.status != expected.status || record.pending_decision != expected.pending_decision
        {
            return Err(StoreError::Conflict(format!(
                "entity {entity_id} changed since it was read (status '{}')",
                record.status
            )));
        }

        record.status = new_status;
        record.pending_decision = pending_decision;
        Ok(())
    }
}

/// In-memory rule store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, rule: Rule) {
        if let Ok(mut rules) = self.rules.write() {
            rules.push(rule);
        }
    }
}

impl RuleStore for InMemoryRuleStore {
    fn applicable_rules(&self, tenant: Option<TenantId>) -> Result<Vec<Rule>, StoreError> {
        let rules = self.rules.read().map_err(|_| poisoned())?;
        Ok(rules
            .iter()
            .filter(|r| r.applies_to(tenant))
            .cloned()
            .collect())
    }
}

/// In-memory decision store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    decisions: RwLock<HashMap<DecisionId, Decision>>,
}

impl InMemoryDecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All decisions for one entity, oldest first.
    pub fn for_entity(&self, entity_id: EntityId) -> Vec<Decision> {
        let Ok(decisions) = self.decisions.read() else {
            return Vec::new();
        };
        let mut rows: Vec<Decision> = decisions
            .values()
            .filter(|d| d.entity_id == entity_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.requested_at);
        rows
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn insert(&self, decision: Decision) -> Result<(), StoreError> {
        let mut decisions = self.decisions.write().map_err(|_| poisoned())?;
        if decisions.contains_key(&decision.id) {
            return Err(StoreError::Conflict(format!(
                "decision {} already exists",
                decision.id
            )));
        }
        decisions.insert(decision.id, decision);
        Ok(())
    }

    fn get(&self, id: DecisionId) -> Result<Decision, StoreError> {
        let decisions = self.decisions.read().map_err(|_| poisoned())?;
        decisions.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn update(&self, decision: Decision) -> Result<(), StoreError> {
        let mut decisions = self.decisions.write().map_err(|_| poisoned())?;
        if !decisions.contains_key(&decision.id) {
            return Err(StoreError::NotFound);
        }
        decisions.insert(decision.id, decision);
        Ok(())
    }

    fn pending_for_entity(&self, entity_id: EntityId) -> Result<Option<Decision>, StoreError> {
        let decisions = self.decisions.read().map_err(|_| poisoned())?;
        Ok(decisions
            .values()
            .find(|d| d.entity_id == entity_id && d.is_pending())
            .cloned())
    }
}
