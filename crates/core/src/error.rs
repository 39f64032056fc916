//! Engine error model.

use thiserror::Error;

/// Result type used across the decision core.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error taxonomy.
///
/// Keep this focused on deterministic business failures. Only genuinely
/// unexpected faults (IO, poisoned locks) should reach a panic path.
///
/// Recovery expectations:
/// - `Configuration`: logged, the offending rule never matches, evaluation
///   continues over the rest of the rule set.
/// - `Conflict`: optimistic precondition failed on a write; the caller must
///   re-fetch and retry explicitly. The engine never retries silently.
/// - `Validation`: rejected before any mutation.
/// - `IneligibleRollback`: rejected, ledger untouched.
/// - `DependencyTimeout`: advisory signal unavailable; callers degrade
///   gracefully and must not surface this as an overall failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A rule or condition is malformed (configuration data, not input).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An optimistic precondition failed on a status-changing write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller input failed validation (e.g. refusal without a comment).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A rollback request failed the eligibility rules.
    #[error("rollback ineligible: {0}")]
    IneligibleRollback(String),

    /// An optional advisory dependency timed out or was unavailable.
    #[error("dependency timeout: {0}")]
    DependencyTimeout(String),

    /// A requested record was not found.
    #[error("not found")]
    NotFound,

    /// The acting principal lacks the required role/permission.
    #[error("unauthorized")]
    Unauthorized,
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn ineligible_rollback(msg: impl Into<String>) -> Self {
        Self::IneligibleRollback(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
