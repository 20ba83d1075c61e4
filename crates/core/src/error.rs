//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger core.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Domain-level error for the blood unit ledger.
///
/// Keep this focused on deterministic business failures (validation, missing
/// stock, state-machine violations). Infrastructure concerns belong elsewhere.
/// All errors are reported synchronously and imply no partial mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A value failed validation (bad shape/range). Caller error, never
    /// retried automatically.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A blood-type label is unknown or cannot be normalized to a catalog
    /// member.
    #[error("invalid blood type: {0}")]
    InvalidBloodType(String),

    /// Aggregate stock for the requested type is below the required volume.
    /// Nothing was mutated; safe to retry after new donations arrive.
    #[error("insufficient stock of {blood_type}: requested {requested_ml} ml, available {available_ml} ml")]
    InsufficientStock {
        blood_type: String,
        requested_ml: u32,
        available_ml: u64,
    },

    /// A referenced unit or donor is absent.
    #[error("not found")]
    NotFound,

    /// Donation attempted before the donor's blood group was confirmed.
    #[error("donor is not verified")]
    NotVerified,

    /// Verification-workflow call against an already-verified donor.
    #[error("donor is already verified")]
    AlreadyVerified,

    /// Confirmation attempted with no pending blood group proposal.
    #[error("no pending blood group to confirm")]
    NoPendingValue,

    /// A state conflict (e.g. backwards status transition attempt).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure, empty donor id).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Capability check failed at the service boundary.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_blood_type(label: impl Into<String>) -> Self {
        Self::InvalidBloodType(label.into())
    }

    pub fn insufficient_stock(
        blood_type: impl Into<String>,
        requested_ml: u32,
        available_ml: u64,
    ) -> Self {
        Self::InsufficientStock {
            blood_type: blood_type.into(),
            requested_ml,
            available_ml,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
