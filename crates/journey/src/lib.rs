//! Audit-side read models: donor journeys and inventory views.
//!
//! Everything in this crate is a read-only view recomputable at any time from
//! the unit store; no function here mutates ledger state.

pub mod reader;

pub use reader::{
    UnitView, inventory_snapshot, journey, recompute_inventory, units_by_donor, units_near_expiry,
};
