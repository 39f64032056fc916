//! Rule configuration model.

use serde::{Deserialize, Serialize};

use entrepot_core::{EngineError, EngineResult, RuleId, TenantId, UserId};

use crate::condition::Condition;

/// Visibility scope of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// Applies to every tenant.
    Global,
    /// Applies to a single tenant.
    Tenant(TenantId),
}

/// The effect a matched rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Refuse the entity outright, no approval step.
    Block,
    /// Park the entity in pending validation until a human decides.
    RequireApproval,
    /// Record an advisory decision; no status change.
    AlertOnly,
    /// Force a specific candidate during selection, bypassing scoring.
    ForceSelection { candidate: String },
    /// Attach a tag to the entity (advisory decision + assignment).
    AssignTag { tag: String },
    /// Assign a packaging preset to the entity (advisory decision + assignment).
    AssignPackage { package: String },
}

impl ActionKind {
    /// Actions that only record observability decisions and assignments,
    /// without touching entity status.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            ActionKind::AlertOnly
                | ActionKind::ForceSelection { .. }
                | ActionKind::AssignTag { .. }
                | ActionKind::AssignPackage { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Block => "block",
            ActionKind::RequireApproval => "require_approval",
            ActionKind::AlertOnly => "alert_only",
            ActionKind::ForceSelection { .. } => "force_selection",
            ActionKind::AssignTag { .. } => "assign_tag",
            ActionKind::AssignPackage { .. } => "assign_package",
        }
    }
}

/// A configured rule: predicate + action + priority.
///
/// Conditions combine with implicit AND. Priority orders evaluation (lower
/// evaluates first); ties are broken by rule id so ordering is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub scope: RuleScope,
    pub conditions: Vec<Condition>,
    pub action: ActionKind,
    pub priority: i32,
    pub active: bool,
    /// Operator-facing message, used as the blocking reason on decisions.
    pub message: String,
    /// Users allowed to decide a pending validation. Empty = any authorized user.
    #[serde(default)]
    pub approvers: Vec<UserId>,
}

impl Rule {
    pub fn new(id: RuleId, scope: RuleScope, action: ActionKind, priority: i32) -> Self {
        Self {
            id,
            scope,
            conditions: Vec::new(),
            action,
            priority,
            active: true,
            message: String::new(),
            approvers: Vec::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_approvers(mut self, approvers: Vec<UserId>) -> Self {
        self.approvers = approvers;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether this rule applies to an entity owned by `tenant_id`.
    pub fn applies_to(&self, tenant_id: Option<TenantId>) -> bool {
        match self.scope {
            RuleScope::Global => true,
            RuleScope::Tenant(t) => tenant_id == Some(t),
        }
    }

    /// Structural validation, run when a rule set is loaded.
    ///
    /// A rule that fails validation is logged and skipped by the matcher; it
    /// never aborts evaluation of the remaining rules.
    pub fn validate(&self) -> EngineResult<()> {
        for condition in &self.conditions {
            if condition.field.trim().is_empty() {
                return Err(EngineError::configuration(format!(
                    "rule {}: condition has an empty field path",
                    self.id
                )));
            }
            if condition.operator.requires_list() && !condition.value.is_array() {
                return Err(EngineError::configuration(format!(
                    "rule {}: operator {:?} requires a list value on field '{}'",
                    self.id, condition.operator, condition.field
                )));
            }
        }
        Ok(())
    }
}
