//! `entrepot-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the engine error taxonomy, actor identity for
//! audit rows, and the read-only entity snapshot passed into rule evaluation.

pub mod actor;
pub mod error;
pub mod id;
pub mod snapshot;

pub use actor::Actor;
pub use error::{EngineError, EngineResult};
pub use id::{DecisionId, EntityId, RuleId, TenantId, TransitionId, UserId};
pub use snapshot::EntitySnapshot;
