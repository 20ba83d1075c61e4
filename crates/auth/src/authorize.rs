use std::collections::HashSet;

use thiserror::Error;

use crate::{Permission, PrincipalId, Role, roles::role_permissions};

/// A fully resolved principal for authorization decisions.
///
/// Construction of this object is intentionally decoupled from storage and
/// transport: the caller derives roles/permissions from whatever identity
/// source it trusts and hands the result to the ledger facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub roles: Vec<Role>,
    /// Permissions granted directly, on top of whatever the roles map to.
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for one operation.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// Effective permissions are the union of direct grants and the default
/// role mapping; `"*"` allows everything.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let mut perms: HashSet<String> = principal
        .permissions
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();
    for role in &principal.roles {
        for p in role_permissions(role) {
            perms.insert(p.as_str().to_string());
        }
    }

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
