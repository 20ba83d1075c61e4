use std::collections::BTreeMap;

use hemotrack_core::{BloodType, LedgerError};

use crate::store::UnitStore;

/// Incrementally maintained aggregate of stored volume per blood type.
///
/// This is a cache of the truth held by [`UnitStore`], not an independent
/// source: every unit creation, split, dispatch, spoilage, and expiry must be
/// paired 1:1 with a `credit`/`debit` in the same logical transaction.
/// Divergence from `UnitStore::stored_volume_by_type` is a fatal defect, not
/// a recoverable runtime error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryIndex {
    stored_ml: BTreeMap<BloodType, u64>,
}

impl InventoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record newly stored volume of a type.
    pub fn credit(&mut self, blood_type: &BloodType, volume_ml: u32) {
        *self.stored_ml.entry(blood_type.clone()).or_default() += u64::from(volume_ml);
    }

    /// Record volume leaving the stored state (dispatch, split, spoilage,
    /// expiry). Underflow means a caller debited without a matching stored
    /// unit — an invariant violation.
    pub fn debit(&mut self, blood_type: &BloodType, volume_ml: u32) -> Result<(), LedgerError> {
        let available = self.stored_ml.entry(blood_type.clone()).or_default();
        let volume = u64::from(volume_ml);
        debug_assert!(
            *available >= volume,
            "inventory underflow for {blood_type}: debit {volume} ml of {available} ml"
        );
        if *available < volume {
            return Err(LedgerError::conflict(format!(
                "inventory underflow for {blood_type}: debit {volume} ml of {available} ml"
            )));
        }
        *available -= volume;
        Ok(())
    }

    /// O(1) read of the cached aggregate for one type.
    pub fn available(&self, blood_type: &BloodType) -> u64 {
        self.stored_ml.get(blood_type).copied().unwrap_or(0)
    }

    /// Cached aggregate for every type with recorded volume.
    pub fn snapshot(&self) -> BTreeMap<BloodType, u64> {
        self.stored_ml
            .iter()
            .filter(|&(_, &v)| v > 0)
            .map(|(t, &v)| (t.clone(), v))
            .collect()
    }

    /// Consistency check against the ground truth; used by tests and debug
    /// assertions at transaction boundaries.
    pub fn matches(&self, store: &UnitStore) -> bool {
        let truth = store.stored_volume_by_type();
        // Entries debited back to zero are equivalent to absent entries.
        self.snapshot() == truth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemotrack_core::TypeCatalog;

    fn o_pos() -> BloodType {
        TypeCatalog::standard().parse("O+").unwrap()
    }

    #[test]
    fn credit_then_debit_round_trips() {
        let mut index = InventoryIndex::new();
        let bt = o_pos();
        index.credit(&bt, 500);
        assert_eq!(index.available(&bt), 500);
        index.debit(&bt, 200).unwrap();
        assert_eq!(index.available(&bt), 300);
    }

    #[test]
    fn unknown_type_reads_zero() {
        let index = InventoryIndex::new();
        assert_eq!(index.available(&o_pos()), 0);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "inventory underflow"))]
    fn underflow_is_an_invariant_violation() {
        let mut index = InventoryIndex::new();
        let bt = o_pos();
        index.credit(&bt, 100);
        let result = index.debit(&bt, 200);
        // In release builds the debug assertion is absent and the caller
        // gets a conflict error instead.
        assert!(matches!(result, Err(LedgerError::Conflict(_))));
    }

    #[test]
    fn snapshot_omits_zeroed_entries() {
        let mut index = InventoryIndex::new();
        let bt = o_pos();
        index.credit(&bt, 100);
        index.debit(&bt, 100).unwrap();
        assert!(index.snapshot().is_empty());
    }

    #[test]
    fn empty_index_matches_empty_store() {
        let index = InventoryIndex::new();
        let store = UnitStore::new();
        assert!(index.matches(&store));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Any credit sequence leaves `available` at the exact sum.
            #[test]
            fn credits_accumulate_exactly(volumes in prop::collection::vec(1u32..10_000, 0..50)) {
                let mut index = InventoryIndex::new();
                let bt = o_pos();
                for &v in &volumes {
                    index.credit(&bt, v);
                }
                let expected: u64 = volumes.iter().map(|&v| u64::from(v)).sum();
                prop_assert_eq!(index.available(&bt), expected);
            }

            /// Debiting everything that was credited always lands on zero and
            /// drops out of the snapshot.
            #[test]
            fn full_drain_zeroes_the_entry(volumes in prop::collection::vec(1u32..10_000, 1..50)) {
                let mut index = InventoryIndex::new();
                let bt = o_pos();
                for &v in &volumes {
                    index.credit(&bt, v);
                }
                for &v in &volumes {
                    index.debit(&bt, v).unwrap();
                }
                prop_assert_eq!(index.available(&bt), 0);
                prop_assert!(index.snapshot().is_empty());
            }
        }
    }
}
