use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use hemotrack_core::{DonorId, LedgerError, TypeCatalog, UnitId};
use hemotrack_ledger::{BloodUnit, InventoryIndex, NewUnit, UnitStore};

use crate::donor::{DonationKind, DonationRecord, DonorProfile};

/// Collection cap in ml per kg of donor body weight.
pub const MAX_ML_PER_KG: u32 = 9;

/// Longest shelf life accepted at collection, in days.
pub const MAX_EXPIRY_DAYS: u32 = 45;

/// Accepted cold-chain storage range, °C (inclusive).
pub const STORAGE_TEMP_RANGE_C: core::ops::RangeInclusive<i16> = 4..=8;

/// One donation, as submitted at the collection point. The blood type is a
/// raw label; canonicalization and validation happen inside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub donor_id: DonorId,
    pub blood_type: String,
    pub volume_ml: u32,
    pub location: String,
    pub collected_at: DateTime<Utc>,
    /// Overrides the profile weight for the volume cap when supplied.
    pub weight_kg: Option<u32>,
    pub expiry_days: Option<u32>,
    pub storage_temp_c: Option<i16>,
    pub kind: DonationKind,
    /// Opaque reference to an off-ledger document (e.g. a consent-form hash).
    pub metadata: Option<String>,
}

/// Validates and records donations; one of the two writers of
/// [`UnitStore`]/[`InventoryIndex`].
///
/// Owns per-donor profiles (verification state, donation history, voluntary
/// totals). `donate` is all-or-nothing: every check runs before the first
/// mutation, so a failed call leaves no partial state.
#[derive(Debug, Clone, Default)]
pub struct DonationRegistry {
    donors: HashMap<DonorId, DonorProfile>,
}

impl DonationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a donor identity (idempotent; a later weight overrides an
    /// earlier one).
    pub fn register_donor(&mut self, donor_id: DonorId, weight_kg: Option<u32>) {
        self.donors
            .entry(donor_id.clone())
            .and_modify(|d| {
                if let Some(w) = weight_kg {
                    d.set_weight_kg(w);
                }
            })
            .or_insert_with(|| DonorProfile::new(donor_id, weight_kg));
    }

    pub fn donor(&self, donor_id: &DonorId) -> Result<&DonorProfile, LedgerError> {
        self.donors.get(donor_id).ok_or(LedgerError::NotFound)
    }

    fn donor_mut(&mut self, donor_id: &DonorId) -> Result<&mut DonorProfile, LedgerError> {
        self.donors.get_mut(donor_id).ok_or(LedgerError::NotFound)
    }

    /// Stage a blood group for confirmation (first phase of verification).
    pub fn propose_blood_group(
        &mut self,
        catalog: &TypeCatalog,
        donor_id: &DonorId,
        label: &str,
    ) -> Result<(), LedgerError> {
        let blood_type = catalog.parse(label)?;
        self.donor_mut(donor_id)?.propose_blood_group(blood_type)
    }

    /// Confirm the pending blood group (second, privileged phase).
    pub fn confirm_blood_group(
        &mut self,
        donor_id: &DonorId,
    ) -> Result<hemotrack_core::BloodType, LedgerError> {
        self.donor_mut(donor_id)?.confirm_blood_group()
    }

    pub fn donation_history(&self, donor_id: &DonorId) -> Result<&[DonationRecord], LedgerError> {
        Ok(self.donor(donor_id)?.donations())
    }

    pub fn voluntary_donations(&self, donor_id: &DonorId) -> Result<u32, LedgerError> {
        Ok(self.donor(donor_id)?.voluntary_donations())
    }

    /// Validate and record a donation: append a `Stored` unit, credit the
    /// inventory, append a `DonationRecord`, bump the voluntary counter.
    ///
    /// Any violation fails with an error naming the rule, and no state is
    /// written.
    pub fn donate(
        &mut self,
        store: &mut UnitStore,
        index: &mut InventoryIndex,
        catalog: &TypeCatalog,
        donation: Donation,
    ) -> Result<UnitId, LedgerError> {
        let donor = self.donor(&donation.donor_id)?;
        if !donor.is_verified() {
            return Err(LedgerError::NotVerified);
        }

        if donation.volume_ml == 0 {
            return Err(LedgerError::validation("donation volume must be positive"));
        }
        if let Some(weight_kg) = donation.weight_kg.or(donor.weight_kg()) {
            // Widen before multiplying; the cap must hold for any u32 weight.
            let cap_ml = u64::from(weight_kg) * u64::from(MAX_ML_PER_KG);
            if u64::from(donation.volume_ml) > cap_ml {
                return Err(LedgerError::validation(format!(
                    "donation volume {} ml exceeds {} ml/kg cap for {} kg donor ({} ml)",
                    donation.volume_ml, MAX_ML_PER_KG, weight_kg, cap_ml
                )));
            }
        }
        if let Some(days) = donation.expiry_days {
            if days > MAX_EXPIRY_DAYS {
                return Err(LedgerError::validation(format!(
                    "expiry of {days} days exceeds the {MAX_EXPIRY_DAYS}-day maximum"
                )));
            }
        }
        if let Some(temp) = donation.storage_temp_c {
            if !STORAGE_TEMP_RANGE_C.contains(&temp) {
                return Err(LedgerError::validation(format!(
                    "storage temperature {temp} °C outside the {}..={} °C range",
                    STORAGE_TEMP_RANGE_C.start(),
                    STORAGE_TEMP_RANGE_C.end()
                )));
            }
        }

        let blood_type = catalog.parse(&donation.blood_type)?;
        match donor.blood_group() {
            Some(confirmed) if *confirmed == blood_type => {}
            Some(confirmed) => {
                return Err(LedgerError::validation(format!(
                    "supplied blood type {blood_type} does not match confirmed group {confirmed}"
                )));
            }
            // Unreachable once verified, kept for exhaustiveness.
            None => return Err(LedgerError::NotVerified),
        }

        let expires_at = donation
            .expiry_days
            .map(|days| donation.collected_at + Duration::days(i64::from(days)));
        let unit = BloodUnit::collected(NewUnit {
            id: UnitId::new(),
            donor_id: donation.donor_id.clone(),
            blood_type: blood_type.clone(),
            volume_ml: donation.volume_ml,
            collected_at: donation.collected_at,
            expires_at,
            storage_temp_c: donation.storage_temp_c,
            location: donation.location.clone(),
            metadata: donation.metadata,
        })?;

        // Validation is complete; the writes below form one transaction.
        let unit_id = store.append(unit)?;
        index.credit(&blood_type, donation.volume_ml);
        self.donor_mut(&donation.donor_id)?.record_donation(
            DonationRecord {
                blood_type,
                volume_ml: donation.volume_ml,
                donated_at: donation.collected_at,
                location: donation.location,
            },
            donation.kind,
        );
        debug_assert!(index.matches(store), "inventory diverged from unit store");

        Ok(unit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemotrack_ledger::UnitStatus;

    fn donor_id() -> DonorId {
        DonorId::new("DN-1").unwrap()
    }

    fn setup_verified(weight_kg: Option<u32>) -> (DonationRegistry, TypeCatalog) {
        let catalog = TypeCatalog::standard();
        let mut registry = DonationRegistry::new();
        registry.register_donor(donor_id(), weight_kg);
        registry
            .propose_blood_group(&catalog, &donor_id(), "O+")
            .unwrap();
        registry.confirm_blood_group(&donor_id()).unwrap();
        (registry, catalog)
    }

    fn donation(volume_ml: u32) -> Donation {
        Donation {
            donor_id: donor_id(),
            blood_type: "o+".to_string(),
            volume_ml,
            location: "Central Bank".to_string(),
            collected_at: Utc::now(),
            weight_kg: None,
            expiry_days: Some(42),
            storage_temp_c: Some(4),
            kind: DonationKind::Voluntary,
            metadata: None,
        }
    }

    #[test]
    fn donation_creates_stored_unit_and_credits_inventory() {
        let (mut registry, catalog) = setup_verified(Some(70));
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        let unit_id = registry
            .donate(&mut store, &mut index, &catalog, donation(450))
            .unwrap();

        let unit = store.get(unit_id).unwrap();
        assert_eq!(unit.status(), UnitStatus::Stored);
        assert_eq!(unit.volume_ml(), 450);
        assert_eq!(unit.blood_type().as_str(), "O+");
        assert!(unit.expires_at().is_some());

        let o_pos = catalog.parse("O+").unwrap();
        assert_eq!(index.available(&o_pos), 450);
        assert_eq!(registry.donation_history(&donor_id()).unwrap().len(), 1);
        assert_eq!(registry.voluntary_donations(&donor_id()).unwrap(), 1);
    }

    #[test]
    fn unverified_donor_is_gated() {
        let catalog = TypeCatalog::standard();
        let mut registry = DonationRegistry::new();
        registry.register_donor(donor_id(), Some(70));
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        let err = registry
            .donate(&mut store, &mut index, &catalog, donation(450))
            .unwrap_err();
        assert_eq!(err, LedgerError::NotVerified);
        assert!(store.is_empty());

        // Pending is still gated; only the terminal state admits donations.
        registry
            .propose_blood_group(&catalog, &donor_id(), "O+")
            .unwrap();
        let err = registry
            .donate(&mut store, &mut index, &catalog, donation(450))
            .unwrap_err();
        assert_eq!(err, LedgerError::NotVerified);
    }

    #[test]
    fn unknown_donor_is_not_found() {
        let (mut registry, catalog) = setup_verified(None);
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();
        let mut d = donation(450);
        d.donor_id = DonorId::new("DN-unknown").unwrap();

        let err = registry
            .donate(&mut store, &mut index, &catalog, d)
            .unwrap_err();
        assert_eq!(err, LedgerError::NotFound);
    }

    #[test]
    fn weight_cap_limits_volume() {
        let (mut registry, catalog) = setup_verified(Some(50));
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        // 50 kg * 9 ml/kg = 450 ml cap.
        let err = registry
            .donate(&mut store, &mut index, &catalog, donation(451))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(store.is_empty());

        registry
            .donate(&mut store, &mut index, &catalog, donation(450))
            .unwrap();
    }

    #[test]
    fn extreme_weight_does_not_break_the_cap() {
        let (mut registry, catalog) = setup_verified(Some(u32::MAX));
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        // A huge registered weight must never shrink (or overflow) the cap.
        registry
            .donate(&mut store, &mut index, &catalog, donation(450))
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn supplied_weight_overrides_profile_weight() {
        let (mut registry, catalog) = setup_verified(Some(100));
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        let mut d = donation(500);
        d.weight_kg = Some(50);
        let err = registry
            .donate(&mut store, &mut index, &catalog, d)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn expiry_and_temperature_ranges_are_enforced() {
        let (mut registry, catalog) = setup_verified(None);
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        let mut d = donation(450);
        d.expiry_days = Some(46);
        assert!(matches!(
            registry.donate(&mut store, &mut index, &catalog, d),
            Err(LedgerError::Validation(_))
        ));

        for temp in [3, 9] {
            let mut d = donation(450);
            d.storage_temp_c = Some(temp);
            assert!(matches!(
                registry.donate(&mut store, &mut index, &catalog, d),
                Err(LedgerError::Validation(_))
            ));
        }

        assert!(store.is_empty());
        assert!(index.snapshot().is_empty());
    }

    #[test]
    fn blood_type_must_match_confirmed_group() {
        let (mut registry, catalog) = setup_verified(None);
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        let mut d = donation(450);
        d.blood_type = "A+".to_string();
        let err = registry
            .donate(&mut store, &mut index, &catalog, d)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let mut d = donation(450);
        d.blood_type = "C+".to_string();
        let err = registry
            .donate(&mut store, &mut index, &catalog, d)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBloodType(_)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// The weight cap is exact: volumes at or under `weight * 9` pass,
            /// anything above is rejected with no state written.
            #[test]
            fn weight_cap_is_exact(weight_kg in 40u32..150, over in 0u32..100) {
                let (mut registry, catalog) = setup_verified(Some(weight_kg));
                let mut store = UnitStore::new();
                let mut index = InventoryIndex::new();
                let cap_ml = weight_kg * MAX_ML_PER_KG;

                registry
                    .donate(&mut store, &mut index, &catalog, donation(cap_ml))
                    .unwrap();
                prop_assert_eq!(store.len(), 1);

                let result =
                    registry.donate(&mut store, &mut index, &catalog, donation(cap_ml + 1 + over));
                prop_assert!(matches!(result, Err(LedgerError::Validation(_))));
                prop_assert_eq!(store.len(), 1);
                prop_assert!(index.matches(&store));
            }
        }
    }

    #[test]
    fn failed_donation_writes_no_partial_state() {
        let (mut registry, catalog) = setup_verified(Some(50));
        let mut store = UnitStore::new();
        let mut index = InventoryIndex::new();

        let _ = registry.donate(&mut store, &mut index, &catalog, donation(9999));

        assert!(store.is_empty());
        assert!(index.snapshot().is_empty());
        assert!(registry.donation_history(&donor_id()).unwrap().is_empty());
        assert_eq!(registry.voluntary_donations(&donor_id()).unwrap(), 0);
    }
}
