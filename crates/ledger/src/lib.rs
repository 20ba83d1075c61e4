//! Blood unit ledger: the unit store and its inventory aggregate.
//!
//! This crate contains the single source of truth for blood units —
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage backend). [`UnitStore`] owns unit records in creation order;
//! [`InventoryIndex`] is the incrementally maintained per-type aggregate and
//! must always agree with a full recomputation from the store.

pub mod inventory;
pub mod store;
pub mod unit;

pub use inventory::InventoryIndex;
pub use store::UnitStore;
pub use unit::{BloodUnit, NewUnit, UnitStatus};
