//! `entrepot-workflow` — entity status lifecycle, decision records and
//! action dispatch.
//!
//! Status transitions only occur through the dispatcher, never through ad
//! hoc status writes elsewhere: the transition ledger must stay consistent
//! with every status change. Planning is pure (no IO); the engine layer
//! commits plans atomically.

pub mod decision;
pub mod dispatch;
pub mod status;

pub use decision::{Decision, DecisionStatus};
pub use dispatch::{
    ActionPlan, Assignment, DecisionOutcome, StatusChange, apply_outcome, plan_action,
    validate_outcome,
};
pub use status::EntityStatus;
