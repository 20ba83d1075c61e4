use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hemotrack_core::{BloodType, Hospital, LedgerError, RequestId, TypeCatalog, UnitId};
use hemotrack_ledger::{BloodUnit, InventoryIndex, UnitStore};

/// One allocation attempt, recorded win or lose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequest {
    pub id: RequestId,
    pub hospital: Hospital,
    pub blood_type: BloodType,
    pub required_ml: u32,
    pub fulfilled: bool,
    pub requested_at: DateTime<Utc>,
}

/// One dispatched portion of a fulfilled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    pub unit_id: UnitId,
    pub volume_ml: u32,
}

/// Result of a successful `request_blood` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationOutcome {
    pub request_id: RequestId,
    pub fulfilled: bool,
    pub dispatched: Vec<Dispatch>,
}

/// What the matching scan decided to do with one unit.
enum PlanStep {
    /// Dispatch the whole unit.
    Whole { unit_id: UnitId, volume_ml: u32 },
    /// Split the unit: reduce it by `take_ml`, dispatch a new child unit.
    Split { unit_id: UnitId, take_ml: u32 },
}

/// Greedy FIFO matcher over the unit store; the second writer of
/// [`UnitStore`]/[`InventoryIndex`].
///
/// Owns the history of allocation attempts. Matching is by creation order
/// only — deliberately expiry-unaware; freshness-aware dispensing would sort
/// candidates by `expires_at` ascending first and changes observable
/// dispatch order.
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    requests: Vec<BloodRequest>,
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded allocation attempts, oldest first.
    pub fn requests(&self) -> &[BloodRequest] {
        &self.requests
    }

    /// Fulfill a volume request against the store, dispatching and splitting
    /// stored units of the matching type in creation order.
    ///
    /// The aggregate stock is compared against `required_ml` before anything
    /// mutates: an `InsufficientStock` failure leaves the store, the index,
    /// and the request history untouched. Because the index always equals the
    /// true dispatchable sum, the success path is guaranteed to fulfill the
    /// request in full.
    pub fn request_blood(
        &mut self,
        store: &mut UnitStore,
        index: &mut InventoryIndex,
        catalog: &TypeCatalog,
        hospital: Hospital,
        blood_type_label: &str,
        required_ml: u32,
        now: DateTime<Utc>,
    ) -> Result<AllocationOutcome, LedgerError> {
        if required_ml == 0 {
            return Err(LedgerError::validation("required volume must be positive"));
        }
        let blood_type = catalog.parse(blood_type_label)?;

        let available = index.available(&blood_type);
        if available < u64::from(required_ml) {
            return Err(LedgerError::insufficient_stock(
                blood_type.as_str(),
                required_ml,
                available,
            ));
        }

        // Plan first over an immutable scan, then apply. The scan walks all
        // units in creation order and filters per unit.
        let mut remaining = required_ml;
        let mut plan: Vec<PlanStep> = Vec::new();
        for unit in store.iter() {
            if remaining == 0 {
                break;
            }
            if !unit.status().is_allocatable() || unit.blood_type() != &blood_type {
                continue;
            }
            if unit.volume_ml() <= remaining {
                remaining -= unit.volume_ml();
                plan.push(PlanStep::Whole {
                    unit_id: unit.id_typed(),
                    volume_ml: unit.volume_ml(),
                });
            } else {
                plan.push(PlanStep::Split {
                    unit_id: unit.id_typed(),
                    take_ml: remaining,
                });
                remaining = 0;
            }
        }
        debug_assert_eq!(
            remaining, 0,
            "stock precondition held but the scan came up short"
        );

        let mut dispatched = Vec::with_capacity(plan.len());
        for step in plan {
            match step {
                PlanStep::Whole { unit_id, volume_ml } => {
                    store.mutate(unit_id, |u| u.dispatch_to(hospital.clone(), now))?;
                    index.debit(&blood_type, volume_ml)?;
                    dispatched.push(Dispatch { unit_id, volume_ml });
                }
                PlanStep::Split { unit_id, take_ml } => {
                    let parent = store.get(unit_id)?.clone();
                    store.mutate(unit_id, |u| u.reduce_volume_ml(take_ml))?;
                    let child =
                        BloodUnit::split_dispatched(&parent, take_ml, hospital.clone(), now)?;
                    let child_id = store.append(child)?;
                    index.debit(&blood_type, take_ml)?;
                    dispatched.push(Dispatch {
                        unit_id: child_id,
                        volume_ml: take_ml,
                    });
                }
            }
        }
        debug_assert!(index.matches(store), "inventory diverged from unit store");

        // The stock-precondition failure path never records a request; the
        // success path always records a fulfilled one.
        let request_id = RequestId::new();
        self.requests.push(BloodRequest {
            id: request_id,
            hospital,
            blood_type,
            required_ml,
            fulfilled: true,
            requested_at: now,
        });

        Ok(AllocationOutcome {
            request_id,
            fulfilled: true,
            dispatched,
        })
    }
}
