//! Optional advisory narrative for selection outcomes.
//!
//! The narrative service is an external collaborator (typically an AI
//! text-generation endpoint) producing an operator-facing explanation of a
//! selection. It is strictly best-effort: implementations bound their own
//! IO with a timeout, and the selection proceeds without a narrative when
//! the call fails.

use std::time::Duration;

use thiserror::Error;

/// Inputs the narrative service may explain.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub chosen: String,
    pub chosen_score: f64,
    /// Full ranking as (candidate id, score), best first.
    pub ranking: Vec<(String, f64)>,
    pub forced: bool,
}

/// Advisory signal failure. Never fatal to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("narrative service timed out after {0:?}")]
    Timeout(Duration),

    #[error("narrative service unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort narrative provider.
///
/// The only operation in the decision core that may block on network IO.
/// Implementations must bound the call with a timeout and map it to
/// `AdvisoryError::Timeout`.
pub trait NarrativeService: Send + Sync {
    fn narrate(&self, request: &NarrativeRequest) -> Result<String, AdvisoryError>;
}
