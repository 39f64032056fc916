//! Actor identity recorded on audit rows.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who performed a status change or decision.
///
/// Automated rule dispatch records `System`; human approvals, refusals and
/// rollbacks record the acting user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User(UserId),
    System,
}

impl Actor {
    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::System => None,
        }
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{id}"),
            Actor::System => f.write_str("system"),
        }
    }
}
