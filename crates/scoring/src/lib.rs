//! `entrepot-scoring` — weighted ranking of carrier candidates.
//!
//! Used where the decision is "choose among many" rather than "match or
//! not". Strict rules dominate: a force-selection rule bypasses scoring
//! entirely. The advisory narrative is best-effort — its failure or timeout
//! never aborts a selection.

pub mod advisory;
pub mod candidate;
pub mod score;
pub mod select;

pub use advisory::{AdvisoryError, NarrativeRequest, NarrativeService};
pub use candidate::Candidate;
pub use score::{ScoreWeights, ScoringContext, score};
pub use select::{ForcedChoice, ScoredCandidate, SelectionOutcome, select};
