//! `entrepot-ledger` — append-only status transition ledger and rollback.
//!
//! Transitions are the system of record for "what happened and when". No
//! component updates or deletes a past row; a rollback appends a new,
//! cross-referenced row and flags the original, in one atomic operation.

pub mod rollback;
pub mod store;
pub mod transition;

pub use rollback::{check_eligibility, plan_rollback};
pub use store::{InMemoryTransitionLedger, LedgerError, TransitionLedger};
pub use transition::Transition;
