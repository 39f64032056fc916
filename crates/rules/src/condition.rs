//! Single-predicate conditions and their evaluation semantics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use entrepot_core::EntitySnapshot;

/// Condition operator.
///
/// Wire tags keep the camelCase spelling of the rule configuration format
/// (`equals`, `notEquals`, `greaterThan`, ...). An unknown tag fails at
/// deserialization, so malformed operators are rejected when the rule set is
/// loaded rather than at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    NotContains,
    In,
    NotIn,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    /// Operators whose comparison value must be a list.
    pub fn requires_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

/// A single field/operator/value predicate evaluated against a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted field path into the entity (one level of relation traversal,
    /// e.g. `client.nom_entreprise`).
    pub field: String,

    pub operator: Operator,

    /// Literal comparison value (scalar, or a list for `in`/`notIn`).
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn unary(field: impl Into<String>, operator: Operator) -> Self {
        Self::new(field, operator, Value::Null)
    }
}

/// Evaluate one condition against an entity snapshot.
///
/// Total and fail-closed: a malformed condition (e.g. `in` without a list
/// value) logs a configuration warning and evaluates to `false`. It never
/// panics, so one bad rule cannot block evaluation of the remaining rule set.
pub fn evaluate(snapshot: &EntitySnapshot, condition: &Condition) -> bool {
    let actual = snapshot.field(&condition.field);
    let expected = &condition.value;

    match condition.operator {
        Operator::Equals => loose_eq(actual, expected),
        Operator::NotEquals => !loose_eq(actual, expected),
        Operator::GreaterThan => numeric_cmp(actual, expected, |a, b| a > b),
        Operator::LessThan => numeric_cmp(actual, expected, |a, b| a < b),
        Operator::GreaterOrEqual => numeric_cmp(actual, expected, |a, b| a >= b),
        Operator::LessOrEqual => numeric_cmp(actual, expected, |a, b| a <= b),
        Operator::Contains => substring(actual, expected),
        Operator::NotContains => !substring(actual, expected),
        Operator::In => membership(actual, expected, condition),
        Operator::NotIn => match list_of(expected, condition) {
            Some(items) => !items.iter().any(|item| loose_eq(actual, item)),
            None => false,
        },
        Operator::IsEmpty => is_empty(actual),
        Operator::IsNotEmpty => !is_empty(actual),
    }
}

/// Equality after identity coercion: numbers compare numerically (including
/// numeric strings), everything else compares by canonical string
/// representation, case-sensitively. `null` only equals `null`.
fn loose_eq(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return a.is_null() && b.is_null();
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x == y;
    }
    text(a) == text(b)
}

fn numeric_cmp(a: &Value, b: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => cmp(x, y),
        // Non-numeric operands make the comparison false, never an error.
        _ => false,
    }
}

/// Case-insensitive substring test on the string representations.
fn substring(haystack: &Value, needle: &Value) -> bool {
    text(haystack)
        .to_lowercase()
        .contains(&text(needle).to_lowercase())
}

fn membership(actual: &Value, expected: &Value, condition: &Condition) -> bool {
    match list_of(expected, condition) {
        Some(items) => items.iter().any(|item| loose_eq(actual, item)),
        None => false,
    }
}

fn list_of<'a>(value: &'a Value, condition: &Condition) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        _ => {
            tracing::warn!(
                field = %condition.field,
                operator = ?condition.operator,
                "list operator used with non-list comparison value; condition never matches"
            );
            None
        }
    }
}

/// `null`, absent and zero-length collections are all empty.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
