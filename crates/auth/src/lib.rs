//! `entrepot-auth` — pure authorization boundary for privileged operations.
//!
//! This crate is intentionally decoupled from HTTP and storage. The decision
//! core consults it before rollbacks and human validation decisions.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use permissions::Permission;
pub use principal::TenantMembership;
pub use roles::Role;
