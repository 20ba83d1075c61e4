//! Donation registry: donor verification and donation intake.
//!
//! This crate contains the donor-facing business rules — the two-phase
//! blood-group verification state machine and the validated donation
//! workflow that creates ledger units. Pure domain logic; the ledger pieces
//! it writes are passed in by reference.

pub mod donation;
pub mod donor;

pub use donation::{
    Donation, DonationRegistry, MAX_EXPIRY_DAYS, MAX_ML_PER_KG, STORAGE_TEMP_RANGE_C,
};
pub use donor::{DonationKind, DonationRecord, DonorProfile, VerificationState};
