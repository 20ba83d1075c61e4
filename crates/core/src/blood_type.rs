//! Blood-group labels and the catalog of valid types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::value_object::ValueObject;

/// Normalize a blood-type label: trim whitespace, uppercase ASCII letters.
///
/// Pure and total; an empty string passes through unchanged.
pub fn canonicalize(label: &str) -> String {
    label.trim().to_ascii_uppercase()
}

/// A canonicalized, catalog-validated blood-group label.
///
/// Constructible only through [`TypeCatalog::parse`], so every `BloodType`
/// in circulation is known to be valid. Compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloodType(String);

impl BloodType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for BloodType {}

impl core::fmt::Display for BloodType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of blood-group labels this deployment accepts.
///
/// Explicit object with explicit lifecycle: constructed once, passed by
/// reference to registry/engine operations. Every externally supplied label
/// is canonicalized and validated here before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCatalog {
    labels: BTreeSet<String>,
}

/// The eight ABO/Rh groups.
const STANDARD_LABELS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

impl TypeCatalog {
    /// Catalog of the eight standard ABO/Rh groups.
    pub fn standard() -> Self {
        Self::with_labels(STANDARD_LABELS)
    }

    /// Catalog over a configured label set (e.g. a superset including rare
    /// groups). Labels are canonicalized on ingestion.
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = labels
            .into_iter()
            .map(|l| canonicalize(l.as_ref()))
            .filter(|l| !l.is_empty())
            .collect();
        Self { labels }
    }

    /// Membership test for a raw label (canonicalized first).
    pub fn is_valid(&self, label: &str) -> bool {
        self.labels.contains(&canonicalize(label))
    }

    /// Canonicalize then validate a raw label, yielding a typed value.
    pub fn parse(&self, label: &str) -> Result<BloodType, LedgerError> {
        let canonical = canonicalize(label);
        if self.labels.contains(&canonical) {
            Ok(BloodType(canonical))
        } else {
            Err(LedgerError::invalid_blood_type(label.trim()))
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
