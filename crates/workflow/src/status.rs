//! Entity status lifecycle.

use serde::{Deserialize, Serialize};

/// Status of an order-like entity, as seen by the decision core.
///
/// Lifecycle: `Normal → PendingValidation → {approved → Normal, refused →
/// Cancelled}`. `Blocked` is the no-approval refusal substate written by a
/// block action. The remaining statuses are set by fulfilment flows outside
/// the core but matter here because they are rollback-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Normal,
    PendingValidation,
    Blocked,
    Cancelled,
    Delivered,
    Closed,
    Archived,
}

impl EntityStatus {
    /// Terminal set: no transition out, including rollback.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntityStatus::Delivered
                | EntityStatus::Cancelled
                | EntityStatus::Closed
                | EntityStatus::Archived
        )
    }

    /// Statuses from which automated dispatch may still act.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, EntityStatus::Normal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Normal => "normal",
            EntityStatus::PendingValidation => "pending_validation",
            EntityStatus::Blocked => "blocked",
            EntityStatus::Cancelled => "cancelled",
            EntityStatus::Delivered => "delivered",
            EntityStatus::Closed => "closed",
            EntityStatus::Archived => "archived",
        }
    }
}

impl core::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
