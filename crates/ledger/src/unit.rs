use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hemotrack_core::{BloodType, DonorId, Entity, Hospital, LedgerError, UnitId};

/// Lifecycle state of a blood unit.
///
/// Transitions are one-way: `Stored` may advance to any terminal state, and
/// terminal states have no outgoing transitions. A unit is never deleted,
/// only status-transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Stored,
    Dispatched,
    Spoiled,
    Expired,
}

impl UnitStatus {
    /// Whether a unit in this state can still be matched against requests.
    pub fn is_allocatable(self) -> bool {
        matches!(self, UnitStatus::Stored)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_allocatable()
    }

    /// One-way transition check: `Stored` advances, terminal states do not.
    pub fn can_transition_to(self, next: UnitStatus) -> bool {
        matches!(self, UnitStatus::Stored) && next != UnitStatus::Stored
    }
}

impl core::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            UnitStatus::Stored => "stored",
            UnitStatus::Dispatched => "dispatched",
            UnitStatus::Spoiled => "spoiled",
            UnitStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Collection-time attributes of a new unit, before it enters the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnit {
    pub id: UnitId,
    pub donor_id: DonorId,
    pub blood_type: BloodType,
    pub volume_ml: u32,
    pub collected_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub storage_temp_c: Option<i16>,
    pub location: String,
    /// Opaque reference to an off-ledger document (e.g. a consent-form hash).
    pub metadata: Option<String>,
}

/// One physical unit of collected blood.
///
/// Entity with append-only history semantics: volume only ever decreases,
/// status only ever advances, and provenance (`donor_id`, `collected_at`,
/// `location`) never changes after collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodUnit {
    id: UnitId,
    donor_id: DonorId,
    blood_type: BloodType,
    volume_ml: u32,
    status: UnitStatus,
    collected_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    storage_temp_c: Option<i16>,
    location: String,
    hospital: Option<Hospital>,
    dispatched_at: Option<DateTime<Utc>>,
    metadata: Option<String>,
}

impl BloodUnit {
    /// A freshly collected, stored unit.
    pub fn collected(new: NewUnit) -> Result<Self, LedgerError> {
        if new.volume_ml == 0 {
            return Err(LedgerError::validation("unit volume must be positive"));
        }
        Ok(Self {
            id: new.id,
            donor_id: new.donor_id,
            blood_type: new.blood_type,
            volume_ml: new.volume_ml,
            status: UnitStatus::Stored,
            collected_at: new.collected_at,
            expires_at: new.expires_at,
            storage_temp_c: new.storage_temp_c,
            location: new.location,
            hospital: None,
            dispatched_at: None,
            metadata: new.metadata,
        })
    }

    /// The dispatched child of a split: carries the parent's donor and
    /// collection metadata, holds the taken volume, and is born `Dispatched`.
    pub fn split_dispatched(
        parent: &BloodUnit,
        take_ml: u32,
        hospital: Hospital,
        dispatched_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if take_ml == 0 {
            return Err(LedgerError::validation("split volume must be positive"));
        }
        Ok(Self {
            id: UnitId::new(),
            donor_id: parent.donor_id.clone(),
            blood_type: parent.blood_type.clone(),
            volume_ml: take_ml,
            status: UnitStatus::Dispatched,
            collected_at: parent.collected_at,
            expires_at: parent.expires_at,
            storage_temp_c: parent.storage_temp_c,
            location: parent.location.clone(),
            hospital: Some(hospital),
            dispatched_at: Some(dispatched_at),
            metadata: parent.metadata.clone(),
        })
    }

    pub fn id_typed(&self) -> UnitId {
        self.id
    }

    pub fn donor_id(&self) -> &DonorId {
        &self.donor_id
    }

    pub fn blood_type(&self) -> &BloodType {
        &self.blood_type
    }

    pub fn volume_ml(&self) -> u32 {
        self.volume_ml
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn storage_temp_c(&self) -> Option<i16> {
        self.storage_temp_c
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn hospital(&self) -> Option<&Hospital> {
        self.hospital.as_ref()
    }

    pub fn dispatched_at(&self) -> Option<DateTime<Utc>> {
        self.dispatched_at
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Reduce a stored unit's volume in place (the stored side of a split).
    ///
    /// The residual volume must stay positive; a full consumption is a
    /// dispatch, not a reduction.
    pub fn reduce_volume_ml(&mut self, by_ml: u32) -> Result<(), LedgerError> {
        if !self.status.is_allocatable() {
            return Err(LedgerError::conflict(format!(
                "cannot reduce volume of a {} unit",
                self.status
            )));
        }
        if by_ml == 0 {
            return Err(LedgerError::validation("volume reduction must be positive"));
        }
        if by_ml >= self.volume_ml {
            return Err(LedgerError::conflict(
                "volume reduction would consume the unit; dispatch it instead",
            ));
        }
        self.volume_ml -= by_ml;
        Ok(())
    }

    /// Transition `Stored -> Dispatched`, stamping the receiving hospital and
    /// dispatch time (each set exactly once).
    pub fn dispatch_to(
        &mut self,
        hospital: Hospital,
        dispatched_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.advance(UnitStatus::Dispatched)?;
        self.hospital = Some(hospital);
        self.dispatched_at = Some(dispatched_at);
        Ok(())
    }

    /// Transition `Stored -> Spoiled` (e.g. cold-chain breach).
    pub fn mark_spoiled(&mut self) -> Result<(), LedgerError> {
        self.advance(UnitStatus::Spoiled)
    }

    /// Transition `Stored -> Expired`.
    pub fn mark_expired(&mut self) -> Result<(), LedgerError> {
        self.advance(UnitStatus::Expired)
    }

    fn advance(&mut self, next: UnitStatus) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::conflict(format!(
                "illegal status transition {} -> {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

impl Entity for BloodUnit {
    type Id = UnitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
