use std::collections::{BTreeMap, HashMap};

use hemotrack_core::{BloodType, DonorId, LedgerError, UnitId};

use crate::unit::{BloodUnit, UnitStatus};

/// Append-mostly store of blood units; the single source of truth for what
/// blood exists, where, and in what state.
///
/// Creation order is significant — it defines allocation priority — so units
/// live in an insertion-ordered `Vec` and are never removed, only
/// status-transitioned in place. Secondary indexes (by id, by donor) are
/// maintained on append.
#[derive(Debug, Clone, Default)]
pub struct UnitStore {
    units: Vec<BloodUnit>,
    by_id: HashMap<UnitId, usize>,
    by_donor: HashMap<DonorId, Vec<usize>>,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new unit at the end of creation order.
    pub fn append(&mut self, unit: BloodUnit) -> Result<UnitId, LedgerError> {
        let id = unit.id_typed();
        if self.by_id.contains_key(&id) {
            return Err(LedgerError::conflict(format!("unit {id} already exists")));
        }
        let idx = self.units.len();
        self.by_id.insert(id, idx);
        self.by_donor
            .entry(unit.donor_id().clone())
            .or_default()
            .push(idx);
        self.units.push(unit);
        Ok(id)
    }

    pub fn get(&self, id: UnitId) -> Result<&BloodUnit, LedgerError> {
        let idx = self.by_id.get(&id).ok_or(LedgerError::NotFound)?;
        Ok(&self.units[*idx])
    }

    /// Apply an in-place transform to one unit.
    ///
    /// Callers must only reduce volume or advance status; the unit's own
    /// methods enforce that contract.
    pub fn mutate<F>(&mut self, id: UnitId, f: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut BloodUnit) -> Result<(), LedgerError>,
    {
        let idx = *self.by_id.get(&id).ok_or(LedgerError::NotFound)?;
        f(&mut self.units[idx])
    }

    /// All units in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &BloodUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units collected from one donor, creation order preserved. Includes
    /// split children, which inherit the parent's donor identity.
    pub fn list_by_donor(&self, donor_id: &DonorId) -> Vec<&BloodUnit> {
        self.by_donor
            .get(donor_id)
            .map(|indexes| indexes.iter().map(|&i| &self.units[i]).collect())
            .unwrap_or_default()
    }

    /// Units of one type in one state, creation order preserved.
    pub fn list_by_type_and_status(
        &self,
        blood_type: &BloodType,
        status: UnitStatus,
    ) -> Vec<&BloodUnit> {
        self.units
            .iter()
            .filter(|u| u.blood_type() == blood_type && u.status() == status)
            .collect()
    }

    /// Full recomputation of stored volume per type.
    ///
    /// This is the ground truth the [`crate::InventoryIndex`] cache must
    /// always agree with.
    pub fn stored_volume_by_type(&self) -> BTreeMap<BloodType, u64> {
        let mut totals: BTreeMap<BloodType, u64> = BTreeMap::new();
        for unit in &self.units {
            if unit.status().is_allocatable() {
                *totals.entry(unit.blood_type().clone()).or_default() +=
                    u64::from(unit.volume_ml());
            }
        }
        totals
    }
}
