use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hemotrack_core::{BloodType, DonorId, Entity, LedgerError};

/// Two-phase blood-group confirmation, per donor identity.
///
/// `Unverified -> PendingVerification -> Verified`, with `Verified` terminal.
/// Donation is gated on the terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "blood_group")]
pub enum VerificationState {
    Unverified,
    PendingVerification(BloodType),
    Verified(BloodType),
}

/// One donation event for a donor identity, kept independently of the unit
/// lifecycle (it survives consumption and splitting of the unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub blood_type: BloodType,
    pub volume_ml: u32,
    pub donated_at: DateTime<Utc>,
    pub location: String,
}

/// How a donation was motivated. Voluntary donations feed a per-donor
/// running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationKind {
    Voluntary,
    Replacement,
}

/// Registry-side view of a donor: verification state, donation history,
/// and the biographical fields donation validation consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorProfile {
    donor_id: DonorId,
    weight_kg: Option<u32>,
    verification: VerificationState,
    donations: Vec<DonationRecord>,
    voluntary_donations: u32,
}

impl DonorProfile {
    pub fn new(donor_id: DonorId, weight_kg: Option<u32>) -> Self {
        Self {
            donor_id,
            weight_kg,
            verification: VerificationState::Unverified,
            donations: Vec::new(),
            voluntary_donations: 0,
        }
    }

    pub fn donor_id(&self) -> &DonorId {
        &self.donor_id
    }

    pub fn weight_kg(&self) -> Option<u32> {
        self.weight_kg
    }

    pub fn set_weight_kg(&mut self, weight_kg: u32) {
        self.weight_kg = Some(weight_kg);
    }

    pub fn verification(&self) -> &VerificationState {
        &self.verification
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.verification, VerificationState::Verified(_))
    }

    /// The confirmed blood group, once verified.
    pub fn blood_group(&self) -> Option<&BloodType> {
        match &self.verification {
            VerificationState::Verified(bt) => Some(bt),
            _ => None,
        }
    }

    pub fn donations(&self) -> &[DonationRecord] {
        &self.donations
    }

    pub fn voluntary_donations(&self) -> u32 {
        self.voluntary_donations
    }

    /// Stage a blood group for confirmation. Allowed only from `Unverified`.
    pub fn propose_blood_group(&mut self, blood_type: BloodType) -> Result<(), LedgerError> {
        match &self.verification {
            VerificationState::Unverified => {
                self.verification = VerificationState::PendingVerification(blood_type);
                Ok(())
            }
            VerificationState::PendingVerification(_) => Err(LedgerError::conflict(
                "a blood group proposal is already pending",
            )),
            VerificationState::Verified(_) => Err(LedgerError::AlreadyVerified),
        }
    }

    /// Confirm the pending blood group (privileged). Moves pending to
    /// confirmed and clears the pending value; `Verified` is terminal.
    pub fn confirm_blood_group(&mut self) -> Result<BloodType, LedgerError> {
        match &self.verification {
            VerificationState::PendingVerification(bt) => {
                let confirmed = bt.clone();
                self.verification = VerificationState::Verified(confirmed.clone());
                Ok(confirmed)
            }
            VerificationState::Unverified => Err(LedgerError::NoPendingValue),
            VerificationState::Verified(_) => Err(LedgerError::AlreadyVerified),
        }
    }

    pub(crate) fn record_donation(&mut self, record: DonationRecord, kind: DonationKind) {
        self.donations.push(record);
        if kind == DonationKind::Voluntary {
            self.voluntary_donations += 1;
        }
    }
}

impl Entity for DonorProfile {
    type Id = DonorId;

    fn id(&self) -> &Self::Id {
        &self.donor_id
    }
}
