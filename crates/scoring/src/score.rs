//! Weighted candidate scoring, clamped to [0, 100].

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

/// Relative weights of the scoring sub-signals.
///
/// Weights are relative, not required to sum to 1; the score normalizes by
/// their total. The degradation penalty is an absolute deduction in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub success_rate: f64,
    pub delay: f64,
    pub cost: f64,
    /// Points subtracted when the carrier reports an active degradation.
    pub degradation_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            success_rate: 0.4,
            delay: 0.3,
            cost: 0.3,
            degradation_penalty: 25.0,
        }
    }
}

/// Normalization baselines derived from the candidate set under comparison.
///
/// Delay and cost sub-scores are relative: the most expensive / slowest
/// candidate in the set scores 0 on that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringContext {
    pub max_cost_cents: i64,
    pub max_delay_hours: f64,
}

impl ScoringContext {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        Self {
            max_cost_cents: candidates.iter().map(|c| c.cost_cents).max().unwrap_or(0),
            max_delay_hours: candidates
                .iter()
                .map(|c| c.avg_delay_hours)
                .fold(0.0, f64::max),
        }
    }
}

/// Score one candidate against the context, in [0, 100].
///
/// Higher is better: high success rate, low delay, low cost. When every
/// candidate shares the same cost (or delay), that axis separates nobody
/// and the remaining signals decide.
pub fn score(candidate: &Candidate, context: &ScoringContext, weights: &ScoreWeights) -> f64 {
    let success = candidate.success_rate.clamp(0.0, 1.0);

    let delay = if context.max_delay_hours > 0.0 {
        1.0 - (candidate.avg_delay_hours / context.max_delay_hours).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let cost = if context.max_cost_cents > 0 {
        1.0 - (candidate.cost_cents as f64 / context.max_cost_cents as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let total_weight = weights.success_rate + weights.delay + weights.cost;
    if total_weight <= 0.0 {
        return 0.0;
    }

    let weighted =
        (weights.success_rate * success + weights.delay * delay + weights.cost * cost)
            / total_weight;

    let mut points = weighted * 100.0;
    if candidate.degraded {
        points -= weights.degradation_penalty;
    }

    points.clamp(0.0, 100.0)
}
