//! Candidate selection: forced rules dominate, then score ranking.

use serde::{Deserialize, Serialize};

use entrepot_core::{EngineError, EngineResult, RuleId};

use crate::advisory::{NarrativeRequest, NarrativeService};
use crate::candidate::Candidate;
use crate::score::{ScoreWeights, ScoringContext, score};

/// A candidate with its computed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

/// A force-selection directive extracted from a matched rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedChoice {
    pub rule_id: RuleId,
    pub candidate: String,
}

/// Result of a selection: the chosen candidate, the ranked rest, and an
/// optional operator-facing narrative.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub chosen: ScoredCandidate,
    pub alternatives: Vec<ScoredCandidate>,
    /// Set when a force-selection rule bypassed scoring.
    pub forced_by: Option<RuleId>,
    pub narrative: Option<String>,
}

/// Choose among candidates.
///
/// A forced choice is honored unconditionally, regardless of computed
/// scores (strict rules dominate). Otherwise candidates rank by score
/// descending; ties break by lower cost, then candidate id, so the result
/// is fully deterministic.
///
/// The narrative is attached best-effort: a timeout or unavailable service
/// is logged and the numeric outcome is returned without it.
pub fn select(
    candidates: &[Candidate],
    forced: Option<ForcedChoice>,
    weights: &ScoreWeights,
    narrative: Option<&dyn NarrativeService>,
) -> EngineResult<SelectionOutcome> {
    if candidates.is_empty() {
        return Err(EngineError::validation("no candidates to select from"));
    }

    let context = ScoringContext::from_candidates(candidates);
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| ScoredCandidate {
            candidate: c.clone(),
            score: score(c, &context, weights),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.candidate.cost_cents.cmp(&b.candidate.cost_cents))
            .then_with(|| a.candidate.id.cmp(&b.candidate.id))
    });

    let mut forced_by = None;
    let chosen_index = match forced {
        Some(choice) => match scored.iter().position(|s| s.candidate.id == choice.candidate) {
            Some(idx) => {
                forced_by = Some(choice.rule_id);
                idx
            }
            None => {
                // A forced candidate missing from the offer set is a
                // configuration fault; fall back to the numeric ranking.
                tracing::warn!(
                    rule_id = %choice.rule_id,
                    candidate = %choice.candidate,
                    "forced candidate not among offered candidates; falling back to scoring"
                );
                0
            }
        },
        None => 0,
    };

    let chosen = scored.remove(chosen_index);
    let alternatives = scored;

    let narrative = narrative.and_then(|service| {
        let request = NarrativeRequest {
            chosen: chosen.candidate.id.clone(),
            chosen_score: chosen.score,
            ranking: std::iter::once(&chosen)
                .chain(alternatives.iter())
                .map(|s| (s.candidate.id.clone(), s.score))
                .collect(),
            forced: forced_by.is_some(),
        };
        match service.narrate(&request) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(%err, "narrative unavailable; returning numeric ranking only");
                None
            }
        }
    });

    Ok(SelectionOutcome {
        chosen,
        alternatives,
        forced_by,
        narrative,
    })
}
