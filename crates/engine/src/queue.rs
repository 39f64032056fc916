//! Bounded-retry push queue for third-party synchronization.
//!
//! Stock and catalog pushes to external marketplaces fail routinely
//! (timeouts, throttling). The queue retries each task a bounded number of
//! times with backoff; a task that exhausts its attempts parks in
//! `Unresolved` for manual intervention instead of retrying forever.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique push task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task kind for routing to the appropriate handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Push stock levels to an external channel.
    StockSync,
    /// Push catalog/product data to an external channel.
    CatalogSync,
    /// Generic/custom task.
    Custom { kind: String },
}

/// Task execution status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, waiting to be picked up.
    Pending,
    /// Failed, will be retried after backoff.
    Failed { error: String, attempt: u32 },
    /// Exhausted retries; parked for manual intervention.
    Unresolved { error: String, attempts: u32 },
    /// Completed successfully.
    Done,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Unresolved { .. })
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, TaskStatus::Failed { .. })
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries.
    Fixed,
    /// Exponential backoff: base * 2^(attempt - 1).
    Exponential,
    /// Linear backoff: base * attempt.
    Linear,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1))),
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt.max(1)),
        };
        delay.min(self.max_delay)
    }
}

/// One queued push task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTask {
    pub id: TaskId,
    pub kind: TaskKind,
    pub payload: serde_json::Value,
    pub status: TaskStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    /// Earliest time the next attempt may run. `None` means immediately.
    pub next_attempt_at: Option<DateTime<Utc>>,
}

/// In-memory push queue with bounded retries.
///
/// Single-threaded sweep model: callers drive it by calling `run_once`
/// with a clock value, which makes the retry schedule fully testable.
#[derive(Debug, Default)]
pub struct PushQueue {
    tasks: Mutex<Vec<PushTask>>,
    policy: RetryPolicy,
}

impl PushQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            policy,
        }
    }

    pub fn enqueue(
        &self,
        kind: TaskKind,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> TaskId {
        let task = PushTask {
            id: TaskId::new(),
            kind,
            payload,
            status: TaskStatus::Pending,
            attempts: 0,
            created_at: now,
            next_attempt_at: None,
        };
        let id = task.id;
        self.lock().push(task);
        id
    }

    pub fn task(&self, id: TaskId) -> Option<PushTask> {
        self.lock().iter().find(|t| t.id == id).cloned()
    }

    pub fn tasks(&self) -> Vec<PushTask> {
        self.lock().clone()
    }

    /// Run one sweep over due tasks. Returns how many were attempted.
    ///
    /// A failing task is rescheduled with backoff until the policy's
    /// attempt budget is spent, then parked as `Unresolved`.
    pub fn run_once<H>(&self, now: DateTime<Utc>, handler: H) -> usize
    where
        H: Fn(&PushTask) -> Result<(), String>,
    {
        let mut tasks = self.lock();
        let mut attempted = 0;

        for task in tasks.iter_mut() {
            if task.status.is_terminal() {
                continue;
            }
            if let Some(at) = task.next_attempt_at {
                if at > now {
                    continue;
                }
            }

            attempted += 1;
            task.attempts += 1;

            match handler(task) {
                Ok(()) => {
                    task.status = TaskStatus::Done;
                    task.next_attempt_at = None;
                }
                Err(error) => {
                    if task.attempts >= self.policy.max_attempts {
                        tracing::error!(
                            task_id = %task.id,
                            attempts = task.attempts,
                            %error,
                            "push task unresolved after exhausting retries"
                        );
                        task.status = TaskStatus::Unresolved {
                            error,
                            attempts: task.attempts,
                        };
                        task.next_attempt_at = None;
                    } else {
                        let delay = self.policy.delay_for(task.attempts);
                        tracing::warn!(
                            task_id = %task.id,
                            attempt = task.attempts,
                            retry_in_secs = delay.as_secs(),
                            %error,
                            "push task failed; scheduling retry"
                        );
                        task.next_attempt_at = Some(
                            now + TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX),
                        );
                        task.status = TaskStatus::Failed {
                            error,
                            attempt: task.attempts,
                        };
                    }
                }
            }
        }

        attempted
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PushTask>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
