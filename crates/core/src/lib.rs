//! `hemotrack-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives for the blood unit ledger
//! (no infrastructure concerns): strongly-typed identifiers, the error
//! taxonomy, and the blood-type catalog every other crate validates against.

pub mod blood_type;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use blood_type::{BloodType, TypeCatalog, canonicalize};
pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{DonorId, Hospital, RequestId, UnitId};
pub use value_object::ValueObject;
