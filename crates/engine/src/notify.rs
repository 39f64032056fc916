//! Outbound operator notifications.
//!
//! Delivery is fire-and-forget: a notification that cannot be delivered is
//! logged and dropped, and never fails the operation that produced it.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use entrepot_core::{EntityId, RuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A require-approval rule parked an entity; approvers should look.
    ValidationRequested,
    /// A block rule refused an entity outright.
    EntityBlocked,
    /// Advisory rule fired (alert, tag, packaging, forced selection).
    Alert,
    /// A pending decision was approved or refused.
    DecisionSettled,
    /// A transition was rolled back.
    RollbackApplied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub entity_id: EntityId,
    pub rule_id: Option<RuleId>,
    pub message: String,
}

/// Delivery sink for operator notifications.
///
/// Implementations swallow their own failures.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: Notification);
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    fn deliver(&self, notification: Notification) {
        (**self).deliver(notification)
    }
}

/// Sink that logs every notification and drops it. Default wiring.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: Notification) {
        tracing::info!(
            kind = ?notification.kind,
            entity_id = %notification.entity_id,
            message = %notification.message,
            "notification"
        );
    }
}

/// Sink that records deliveries in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notification: Notification) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(notification);
        }
    }
}
