use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use hemotrack_core::{DonorId, UnitId};
use hemotrack_ledger::{BloodUnit, InventoryIndex, UnitStatus, UnitStore};

/// Read-model row: a point-in-time snapshot of one unit, detached from the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    pub unit_id: UnitId,
    pub donor_id: DonorId,
    pub blood_type: String,
    pub volume_ml: u32,
    pub status: UnitStatus,
    pub collected_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub location: String,
    pub hospital: Option<String>,
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl From<&BloodUnit> for UnitView {
    fn from(unit: &BloodUnit) -> Self {
        Self {
            unit_id: unit.id_typed(),
            donor_id: unit.donor_id().clone(),
            blood_type: unit.blood_type().as_str().to_string(),
            volume_ml: unit.volume_ml(),
            status: unit.status(),
            collected_at: unit.collected_at(),
            expires_at: unit.expires_at(),
            location: unit.location().to_string(),
            hospital: unit.hospital().map(|h| h.as_str().to_string()),
            dispatched_at: unit.dispatched_at(),
        }
    }
}

/// A donor's full unit history for audit presentation: ascending by
/// collection time, ties broken by creation order (stable sort).
pub fn journey(store: &UnitStore, donor_id: &DonorId) -> Vec<UnitView> {
    let mut views: Vec<UnitView> = store
        .list_by_donor(donor_id)
        .into_iter()
        .map(UnitView::from)
        .collect();
    views.sort_by_key(|v| v.collected_at);
    views
}

/// A donor's units in raw creation order, unsorted.
pub fn units_by_donor(store: &UnitStore, donor_id: &DonorId) -> Vec<UnitView> {
    store
        .list_by_donor(donor_id)
        .into_iter()
        .map(UnitView::from)
        .collect()
}

/// O(1) view of the cached inventory aggregate, keyed by canonical label.
pub fn inventory_snapshot(index: &InventoryIndex) -> BTreeMap<String, u64> {
    index
        .snapshot()
        .into_iter()
        .map(|(t, v)| (t.as_str().to_string(), v))
        .collect()
}

/// Recompute-on-read variant: full scan of the store. Must equal
/// [`inventory_snapshot`] at any instant with no in-flight mutation.
pub fn recompute_inventory(store: &UnitStore) -> BTreeMap<String, u64> {
    store
        .stored_volume_by_type()
        .into_iter()
        .map(|(t, v)| (t.as_str().to_string(), v))
        .collect()
}

/// Allocatable units expiring within the window, creation order preserved.
pub fn units_near_expiry(store: &UnitStore, now: DateTime<Utc>, within_days: u32) -> Vec<UnitView> {
    let horizon = now + Duration::days(i64::from(within_days));
    store
        .iter()
        .filter(|u| u.status().is_allocatable())
        .filter(|u| u.expires_at().is_some_and(|at| at <= horizon))
        .map(UnitView::from)
        .collect()
}
