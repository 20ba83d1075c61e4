//! `hemotrack-auth` — pure authorization boundary for the ledger core.
//!
//! This crate is intentionally decoupled from transport and storage: callers
//! resolve a [`Principal`] however they like and the facade runs
//! [`authorize`] before every mutating operation.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use permissions::{Permission, ops};
pub use principal::PrincipalId;
pub use roles::{Role, role_permissions};
