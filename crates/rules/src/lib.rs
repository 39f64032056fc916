//! `entrepot-rules` — declarative rule model, condition evaluator and matcher.
//!
//! Rules are configuration data: created and edited by administrators, never
//! mutated by the engine. Evaluation is pure and deterministic — the same
//! snapshot against the same rule set always yields the same match.

pub mod condition;
pub mod matcher;
pub mod rule;

pub use condition::{Condition, Operator, evaluate};
pub use matcher::{match_first, matches};
pub use rule::{ActionKind, Rule, RuleScope};
