use serde::{Deserialize, Serialize};

use entrepot_core::TenantId;

/// A user's membership in a tenant.
///
/// This is an authorization boundary object: it states *which tenant* the
/// user is acting within and which roles/permissions are granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<crate::Role>,
    pub permissions: Vec<crate::Permission>,
}
