use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;
use crate::permissions::ops;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; [`role_permissions`] provides the
/// default policy mapping for the blood bank's built-in roles.
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
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default role → permission mapping for the built-in roles.
///
/// Unknown roles grant nothing; deployments can layer their own policy source
/// on top.
pub fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::new("*")],
        // Orders blood for patients.
        "physician" => vec![ops::blood_request(), ops::ledger_read()],
        // Collects donations and manages donor intake.
        "phlebotomist" => vec![
            ops::donation_record(),
            ops::donor_manage(),
            ops::ledger_read(),
        ],
        // Confirms blood groups and handles spoilage/expiry.
        "lab_technician" => vec![
            ops::verification_confirm(),
            ops::unit_update(),
            ops::ledger_read(),
        ],
        "auditor" => vec![ops::ledger_read()],
        _ => Vec::new(),
    }
}
