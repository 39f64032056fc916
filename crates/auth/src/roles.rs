use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer. The policy source maps each
/// role to the permissions it grants; the engine only ever checks
/// permissions, never roles directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Warehouse floor operator: prepares and dispatches orders.
    pub fn operator() -> Self {
        Self::new("operator")
    }

    /// Supervisor: decides pending validations.
    pub fn supervisor() -> Self {
        Self::new("supervisor")
    }

    /// Administrator: rule configuration and ledger rollbacks.
    pub fn admin() -> Self {
        Self::new("admin")
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
