//! Priority-ordered, first-match-wins rule matching.

use entrepot_core::EntitySnapshot;

use crate::condition::evaluate;
use crate::rule::Rule;

/// Whether every condition of `rule` holds for `snapshot`.
///
/// Conditions combine with logical AND. An empty condition list never
/// matches: a rule with no predicate is configuration noise, not a
/// catch-all.
pub fn matches(snapshot: &EntitySnapshot, rule: &Rule) -> bool {
    if rule.conditions.is_empty() {
        return false;
    }
    rule.conditions.iter().all(|c| evaluate(snapshot, c))
}

/// Return the first fully-matching rule, walking rules by ascending
/// priority (ties broken by rule id, so the order is total and
/// deterministic).
///
/// First-match-wins is intentional: only the highest-priority matching
/// rule's action takes effect; later matches have no cumulative effect.
/// Inactive rules and rules that fail structural validation are skipped —
/// a malformed rule is logged and never blocks the rest of the sweep.
///
/// Pure function: no side effects beyond logging, so re-evaluating the
/// same snapshot against the same rule set always yields the same result.
pub fn match_first<'a>(snapshot: &EntitySnapshot, rules: &'a [Rule]) -> Option<&'a Rule> {
    let mut candidates: Vec<&Rule> = rules
        .iter()
        .filter(|r| r.active)
        .filter(|r| match r.validate() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(rule_id = %r.id, %err, "skipping malformed rule");
                false
            }
        })
        .collect();

    candidates.sort_by_key(|r| (r.priority, r.id));

    candidates.into_iter().find(|r| matches(snapshot, r))
}
