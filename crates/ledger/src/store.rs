//! Transition ledger storage abstraction.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use entrepot_core::{EntityId, TransitionId};

use crate::transition::Transition;

/// Ledger operation error.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transition not found: {0}")]
    NotFound(TransitionId),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),
}

/// Append-only transition ledger.
///
/// No update or delete operations exist on purpose. `append_rollback` is
/// the single place where a past row changes, and only its
/// `is_rolled_back` flag, atomically with the compensating append — in a
/// persistent implementation both belong to one transaction.
pub trait TransitionLedger: Send + Sync {
    /// Append a forward transition.
    fn append(&self, transition: Transition) -> Result<Transition, LedgerError>;

    /// Atomically flag `original` as rolled back and append the
    /// compensating record.
    ///
    /// Implementations must reject the call (leaving the ledger untouched)
    /// when the original is missing, already flagged, or the compensating
    /// record does not reference it.
    fn append_rollback(
        &self,
        original: TransitionId,
        compensating: Transition,
    ) -> Result<Transition, LedgerError>;

    fn get(&self, id: TransitionId) -> Result<Transition, LedgerError>;

    /// All transitions for one entity, in append order.
    fn for_entity(&self, entity_type: &str, entity_id: EntityId)
    -> Result<Vec<Transition>, LedgerError>;
}

impl<L> TransitionLedger for Arc<L>
where
    L: TransitionLedger + ?Sized,
{
    fn append(&self, transition: Transition) -> Result<Transition, LedgerError> {
        (**self).append(transition)
    }

    fn append_rollback(
        &self,
        original: TransitionId,
        compensating: Transition,
    ) -> Result<Transition, LedgerError> {
        (**self).append_rollback(original, compensating)
    }

    fn get(&self, id: TransitionId) -> Result<Transition, LedgerError> {
        (**self).get(id)
    }

    fn for_entity(
        &self,
        entity_type: &str,
        entity_id: EntityId,
    ) -> Result<Vec<Transition>, LedgerError> {
        (**self).for_entity(entity_type, entity_id)
    }
}

/// In-memory append-only transition ledger.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryTransitionLedger {
    rows: RwLock<Vec<Transition>>,
}

impl InMemoryTransitionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransitionLedger for InMemoryTransitionLedger {
    fn append(&self, transition: Transition) -> Result<Transition, LedgerError> {
        if transition.is_rollback || transition.reverts.is_some() {
            return Err(LedgerError::InvalidAppend(
                "rollback records must go through append_rollback".to_string(),
            ));
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::InvalidAppend("lock poisoned".to_string()))?;
        rows.push(transition.clone());
        Ok(transition)
    }

    fn append_rollback(
        &self,
        original: TransitionId,
        compensating: Transition,
    ) -> Result<Transition, LedgerError> {
        if compensating.reverts != Some(original) || !compensating.is_rollback {
            return Err(LedgerError::InvalidAppend(
                "compensating record must reference the original transition".to_string(),
            ));
        }

        // One write lock covers the flag and the append: no observer can
        // see one without the other.
        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::InvalidAppend("lock poisoned".to_string()))?;

        let row = rows
            .iter_mut()
            .find(|t| t.id == original)
            .ok_or(LedgerError::NotFound(original))?;

        if row.is_rolled_back {
            return Err(LedgerError::Conflict(format!(
                "transition {original} is already rolled back"
            )));
        }

        row.is_rolled_back = true;
        rows.push(compensating.clone());
        Ok(compensating)
    }

    fn get(&self, id: TransitionId) -> Result<Transition, LedgerError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| LedgerError::InvalidAppend("lock poisoned".to_string()))?;
        rows.iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    fn for_entity(
        &self,
        entity_type: &str,
        entity_id: EntityId,
    ) -> Result<Vec<Transition>, LedgerError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| LedgerError::InvalidAppend("lock poisoned".to_string()))?;
        Ok(rows
            .iter()
            .filter(|t| t.entity_type == entity_type && t.entity_id == entity_id)
            .cloned()
            .collect())
    }
}
