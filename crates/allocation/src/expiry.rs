//! Expiry and spoilage transitions.
//!
//! These are the only unit mutations outside the allocation path. They follow
//! the same writer discipline: the status transition and the inventory debit
//! happen in one logical transaction.

use chrono::{DateTime, Utc};

use hemotrack_core::{LedgerError, UnitId};
use hemotrack_ledger::{InventoryIndex, UnitStore};

/// Transition one stored unit to `Spoiled` (e.g. a cold-chain breach) and
/// debit its volume from the inventory.
pub fn mark_spoiled(
    store: &mut UnitStore,
    index: &mut InventoryIndex,
    unit_id: UnitId,
) -> Result<(), LedgerError> {
    let unit = store.get(unit_id)?;
    let blood_type = unit.blood_type().clone();
    let volume_ml = unit.volume_ml();
    store.mutate(unit_id, |u| u.mark_spoiled())?;
    index.debit(&blood_type, volume_ml)?;
    debug_assert!(index.matches(store), "inventory diverged from unit store");
    Ok(())
}

/// Transition every stored unit whose expiry has passed to `Expired`,
/// debiting each from the inventory. Returns the transitioned unit ids in
/// creation order.
pub fn sweep_expired(
    store: &mut UnitStore,
    index: &mut InventoryIndex,
    now: DateTime<Utc>,
) -> Result<Vec<UnitId>, LedgerError> {
    let due: Vec<_> = store
        .iter()
        .filter(|u| u.status().is_allocatable())
        .filter(|u| u.expires_at().is_some_and(|at| at <= now))
        .map(|u| (u.id_typed(), u.blood_type().clone(), u.volume_ml()))
        .collect();

    let mut expired = Vec::with_capacity(due.len());
    for (unit_id, blood_type, volume_ml) in due {
        store.mutate(unit_id, |u| u.mark_expired())?;
        index.debit(&blood_type, volume_ml)?;
        expired.push(unit_id);
    }
    debug_assert!(index.matches(store), "inventory diverged from unit store");
    Ok(expired)
}
