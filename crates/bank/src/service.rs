use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;

use hemotrack_allocation::{AllocationEngine, AllocationOutcome, BloodRequest, expiry};
use hemotrack_auth::{Principal, authorize, ops};
use hemotrack_core::{BloodType, DonorId, Hospital, LedgerError, TypeCatalog, UnitId};
use hemotrack_journey as journey;
use hemotrack_journey::UnitView;
use hemotrack_ledger::{InventoryIndex, UnitStore};
use hemotrack_registry::{Donation, DonationRecord, DonationRegistry};

/// Everything one ledger transaction touches, behind a single lock.
#[derive(Debug, Default)]
struct BankState {
    store: UnitStore,
    index: InventoryIndex,
    registry: DonationRegistry,
    engine: AllocationEngine,
}

/// The blood bank service facade: catalog + unit store + inventory +
/// registry + allocation engine behind one `RwLock`.
///
/// `donate`, `request_blood`, and the expiry operations each hold the write
/// lock for their whole transaction, so concurrent readers never observe a
/// torn write and a failed call leaves no partial state visible. A single
/// global lock is enough at the expected contention level; per-type locking
/// would only matter under heavy parallel allocation. Every mutating entry
/// point runs a capability check first; reads are gated on `ledger.read`.
#[derive(Debug)]
pub struct BloodBank {
    catalog: TypeCatalog,
    state: RwLock<BankState>,
}

impl BloodBank {
    pub fn new(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            state: RwLock::new(BankState::default()),
        }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    fn gate(principal: &Principal, required: &hemotrack_auth::Permission) -> Result<(), LedgerError> {
        authorize(principal, required).map_err(|e| LedgerError::unauthorized(e.to_string()))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, BankState>, LedgerError> {
        self.state
            .write()
            .map_err(|_| LedgerError::conflict("ledger lock poisoned"))
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, BankState>, LedgerError> {
        self.state
            .read()
            .map_err(|_| LedgerError::conflict("ledger lock poisoned"))
    }

    // ── Donor registry ──────────────────────────────────────────────────

    /// Register a donor identity (idempotent).
    pub fn register_donor(
        &self,
        principal: &Principal,
        donor_id: DonorId,
        weight_kg: Option<u32>,
    ) -> Result<(), LedgerError> {
        Self::gate(principal, &ops::donor_manage())?;
        let mut state = self.write_state()?;
        state.registry.register_donor(donor_id.clone(), weight_kg);
        tracing::debug!(donor = %donor_id, "donor registered");
        Ok(())
    }

    /// First verification phase: stage a blood group for confirmation.
    pub fn propose_blood_group(
        &self,
        principal: &Principal,
        donor_id: &DonorId,
        label: &str,
    ) -> Result<(), LedgerError> {
        Self::gate(principal, &ops::donor_manage())?;
        let mut state = self.write_state()?;
        state.registry.propose_blood_group(&self.catalog, donor_id, label)
    }

    /// Second, privileged verification phase: confirm the pending group.
    pub fn confirm_blood_group(
        &self,
        principal: &Principal,
        donor_id: &DonorId,
    ) -> Result<BloodType, LedgerError> {
        Self::gate(principal, &ops::verification_confirm())?;
        let mut state = self.write_state()?;
        let confirmed = state.registry.confirm_blood_group(donor_id)?;
        tracing::info!(donor = %donor_id, blood_group = %confirmed, "blood group confirmed");
        Ok(confirmed)
    }

    // ── Writers ─────────────────────────────────────────────────────────

    /// Validate and record a donation; returns the new unit id.
    pub fn donate(&self, principal: &Principal, donation: Donation) -> Result<UnitId, LedgerError> {
        Self::gate(principal, &ops::donation_record())?;
        let mut state = self.write_state()?;
        let state = &mut *state;
        let unit_id =
            state
                .registry
                .donate(&mut state.store, &mut state.index, &self.catalog, donation)?;
        let unit = state.store.get(unit_id)?;
        tracing::info!(
            unit = %unit_id,
            donor = %unit.donor_id(),
            blood_type = %unit.blood_type(),
            volume_ml = unit.volume_ml(),
            "donation recorded"
        );
        Ok(unit_id)
    }

    /// Fulfill a volume request for a hospital, dispatching/splitting stored
    /// units in creation order. `InsufficientStock` mutates nothing.
    pub fn request_blood(
        &self,
        principal: &Principal,
        hospital: Hospital,
        blood_type_label: &str,
        required_ml: u32,
    ) -> Result<AllocationOutcome, LedgerError> {
        Self::gate(principal, &ops::blood_request())?;
        let mut state = self.write_state()?;
        let state = &mut *state;
        let outcome = state.engine.request_blood(
            &mut state.store,
            &mut state.index,
            &self.catalog,
            hospital.clone(),
            blood_type_label,
            required_ml,
            Utc::now(),
        )?;
        tracing::info!(
            request = %outcome.request_id,
            hospital = %hospital,
            required_ml,
            units = outcome.dispatched.len(),
            "blood request fulfilled"
        );
        Ok(outcome)
    }

    /// Transition one stored unit to `Spoiled` and debit the inventory.
    pub fn mark_spoiled(&self, principal: &Principal, unit_id: UnitId) -> Result<(), LedgerError> {
        Self::gate(principal, &ops::unit_update())?;
        let mut state = self.write_state()?;
        let state = &mut *state;
        expiry::mark_spoiled(&mut state.store, &mut state.index, unit_id)?;
        tracing::warn!(unit = %unit_id, "unit marked spoiled");
        Ok(())
    }

    /// Expire every stored unit whose expiry has passed; returns their ids.
    pub fn sweep_expired(&self, principal: &Principal) -> Result<Vec<UnitId>, LedgerError> {
        Self::gate(principal, &ops::unit_update())?;
        let mut state = self.write_state()?;
        let state = &mut *state;
        let expired = expiry::sweep_expired(&mut state.store, &mut state.index, Utc::now())?;
        if !expired.is_empty() {
            tracing::warn!(count = expired.len(), "expired units swept");
        }
        Ok(expired)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn get_unit(&self, principal: &Principal, unit_id: UnitId) -> Result<UnitView, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(UnitView::from(state.store.get(unit_id)?))
    }

    /// A donor's units in creation order.
    pub fn units_by_donor(
        &self,
        principal: &Principal,
        donor_id: &DonorId,
    ) -> Result<Vec<UnitView>, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(journey::units_by_donor(&state.store, donor_id))
    }

    /// A donor's full unit history, time-ordered for audit presentation.
    pub fn journey(
        &self,
        principal: &Principal,
        donor_id: &DonorId,
    ) -> Result<Vec<UnitView>, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(journey::journey(&state.store, donor_id))
    }

    /// Stored volume per blood type (O(1) cache view).
    pub fn inventory(&self, principal: &Principal) -> Result<BTreeMap<String, u64>, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(journey::inventory_snapshot(&state.index))
    }

    /// Allocatable units expiring within the window.
    pub fn units_near_expiry(
        &self,
        principal: &Principal,
        within_days: u32,
    ) -> Result<Vec<UnitView>, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(journey::units_near_expiry(&state.store, Utc::now(), within_days))
    }

    /// All recorded allocation attempts, oldest first.
    pub fn requests(&self, principal: &Principal) -> Result<Vec<BloodRequest>, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(state.engine.requests().to_vec())
    }

    /// A donor's donation history (independent of unit lifecycle).
    pub fn donation_history(
        &self,
        principal: &Principal,
        donor_id: &DonorId,
    ) -> Result<Vec<DonationRecord>, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        Ok(state.registry.donation_history(donor_id)?.to_vec())
    }

    /// Running total of a donor's voluntary donations.
    pub fn voluntary_donations(
        &self,
        principal: &Principal,
        donor_id: &DonorId,
    ) -> Result<u32, LedgerError> {
        Self::gate(principal, &ops::ledger_read())?;
        let state = self.read_state()?;
        state.registry.voluntary_donations(donor_id)
    }
}

impl Default for BloodBank {
    fn default() -> Self {
        Self::new(TypeCatalog::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemotrack_auth::{PrincipalId, Role};
    use hemotrack_registry::DonationKind;

    fn admin() -> Principal {
        Principal::new(PrincipalId::new()).with_role(Role::new("admin"))
    }

    fn donor_id() -> DonorId {
        DonorId::new("DN-1").unwrap()
    }

    fn donation(volume_ml: u32) -> Donation {
        Donation {
            donor_id: donor_id(),
            blood_type: "O+".to_string(),
            volume_ml,
            location: "Central Bank".to_string(),
            collected_at: Utc::now(),
            weight_kg: None,
            expiry_days: None,
            storage_temp_c: None,
            kind: DonationKind::Voluntary,
            metadata: None,
        }
    }

    fn verified_bank() -> BloodBank {
        let bank = BloodBank::default();
        let root = admin();
        bank.register_donor(&root, donor_id(), Some(80)).unwrap();
        bank.propose_blood_group(&root, &donor_id(), "O+").unwrap();
        bank.confirm_blood_group(&root, &donor_id()).unwrap();
        bank
    }

    #[test]
    fn donate_then_request_round_trip() {
        let bank = verified_bank();
        let root = admin();
        bank.donate(&root, donation(500)).unwrap();

        let outcome = bank
            .request_blood(&root, Hospital::new("General").unwrap(), "O+", 200)
            .unwrap();
        assert!(outcome.fulfilled);

        let inventory = bank.inventory(&root).unwrap();
        assert_eq!(inventory.get("O+"), Some(&300));
    }

    #[test]
    fn unauthorized_principal_is_rejected_before_any_state_change() {
        let bank = verified_bank();
        let nobody = Principal::new(PrincipalId::new());

        let err = bank.donate(&nobody, donation(500)).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        let err = bank
            .request_blood(&nobody, Hospital::new("General").unwrap(), "O+", 100)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));

        assert!(bank.inventory(&admin()).unwrap().is_empty());
    }

    #[test]
    fn role_scoped_principals_reach_their_own_operations() {
        let bank = BloodBank::default();
        let phlebotomist =
            Principal::new(PrincipalId::new()).with_role(Role::new("phlebotomist"));
        let technician =
            Principal::new(PrincipalId::new()).with_role(Role::new("lab_technician"));
        let physician = Principal::new(PrincipalId::new()).with_role(Role::new("physician"));

        bank.register_donor(&phlebotomist, donor_id(), Some(80))
            .unwrap();
        bank.propose_blood_group(&phlebotomist, &donor_id(), "O+")
            .unwrap();
        // Confirmation is privileged: the phlebotomist cannot do it.
        assert!(matches!(
            bank.confirm_blood_group(&phlebotomist, &donor_id()),
            Err(LedgerError::Unauthorized(_))
        ));
        bank.confirm_blood_group(&technician, &donor_id()).unwrap();

        bank.donate(&phlebotomist, donation(450)).unwrap();
        let outcome = bank
            .request_blood(&physician, Hospital::new("General").unwrap(), "O+", 450)
            .unwrap();
        assert!(outcome.fulfilled);
    }

    #[test]
    fn insufficient_stock_surfaces_with_no_request_recorded() {
        let bank = verified_bank();
        let root = admin();
        bank.donate(&root, donation(100)).unwrap();

        let err = bank
            .request_blood(&root, Hospital::new("General").unwrap(), "O+", 500)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        assert!(bank.requests(&root).unwrap().is_empty());
        assert_eq!(bank.inventory(&root).unwrap().get("O+"), Some(&100));
    }

    #[test]
    fn journey_tracks_splits_for_the_donor() {
        let bank = verified_bank();
        let root = admin();
        bank.donate(&root, donation(500)).unwrap();
        bank.request_blood(&root, Hospital::new("General").unwrap(), "O+", 200)
            .unwrap();

        // Original (reduced) unit + dispatched split child.
        let journey = bank.journey(&root, &donor_id()).unwrap();
        assert_eq!(journey.len(), 2);
        let total: u32 = journey.iter().map(|v| v.volume_ml).sum();
        assert_eq!(total, 500);
    }

    #[test]
    fn repeated_inventory_reads_are_identical() {
        let bank = verified_bank();
        let root = admin();
        bank.donate(&root, donation(450)).unwrap();
        assert_eq!(bank.inventory(&root).unwrap(), bank.inventory(&root).unwrap());
    }

    #[test]
    fn near_expiry_and_sweep_work_through_the_facade() {
        let bank = verified_bank();
        let root = admin();
        let mut d = donation(450);
        d.expiry_days = Some(2);
        let unit_id = bank.donate(&root, d).unwrap();

        let near = bank.units_near_expiry(&root, 7).unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].unit_id, unit_id);

        // Nothing has actually expired yet.
        assert!(bank.sweep_expired(&root).unwrap().is_empty());

        bank.mark_spoiled(&root, unit_id).unwrap();
        assert!(bank.inventory(&root).unwrap().is_empty());
        assert!(bank.units_near_expiry(&root, 7).unwrap().is_empty());
    }
}
