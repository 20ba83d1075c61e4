//! Allocation engine: matching hospital requests against stored units.
//!
//! Pure domain logic over the ledger crate's store and inventory. The engine
//! is one of the two writers of the ledger; the expiry/spoilage operations
//! here are the only other unit mutations.

pub mod engine;
pub mod expiry;

pub use engine::{AllocationEngine, AllocationOutcome, BloodRequest, Dispatch};
pub use expiry::{mark_spoiled, sweep_expired};
