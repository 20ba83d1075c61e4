//! `hemotrack-bank` — the blood bank service facade.
//!
//! Composes the ledger, registry, allocation, and journey crates behind a
//! single locked state with capability gating and tracing. This is the crate
//! embedders consume; everything below it is pure domain logic.

pub mod service;

pub use service::BloodBank;
