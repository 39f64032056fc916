//! `entrepot-engine` — orchestration of rule evaluation, validation
//! decisions, rollbacks and candidate selection.
//!
//! This crate composes the pure domain crates against storage traits. All
//! status-changing commits go through an optimistic precondition on the
//! entity store, and every committed change lands a row in the transition
//! ledger. The engine never retries a conflict silently.

pub mod notify;
pub mod queue;
pub mod service;
pub mod store;

#[cfg(test)]
mod scenarios;

pub use notify::{LogSink, Notification, NotificationKind, NotificationSink, RecordingSink};
pub use queue::{BackoffStrategy, PushQueue, PushTask, RetryPolicy, TaskId, TaskKind, TaskStatus};
pub use service::{DecisionResolution, EngineService, EvaluationOutcome, RollbackReceipt};
pub use store::{
    DecisionStore, EntityRecord, EntityStore, InMemoryDecisionStore, InMemoryEntityStore,
    InMemoryRuleStore, RuleStore, StatusExpectation, StoreError,
};
