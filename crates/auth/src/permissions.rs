use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "donation.record").
/// A special wildcard permission `"*"` can be used by policy layers to
/// indicate "allow all" without hardcoding domain permissions into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The capability vocabulary of the blood bank core. Every mutating entry
/// point of the service facade checks exactly one of these.
pub mod ops {
    use super::Permission;

    /// Record a donation (creates a stored unit).
    pub fn donation_record() -> Permission {
        Permission::new("donation.record")
    }

    /// Request blood for a hospital (dispatches/splits units).
    pub fn blood_request() -> Permission {
        Permission::new("blood.request")
    }

    /// Confirm a donor's proposed blood group (privileged second phase).
    pub fn verification_confirm() -> Permission {
        Permission::new("verification.confirm")
    }

    /// Register donors and stage blood-group proposals.
    pub fn donor_manage() -> Permission {
        Permission::new("donor.manage")
    }

    /// Spoilage/expiry status transitions on stored units.
    pub fn unit_update() -> Permission {
        Permission::new("unit.update")
    }

    /// Read-only ledger access (journeys, inventory, request history).
    pub fn ledger_read() -> Permission {
        Permission::new("ledger.read")
    }
}
