//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// value objects with the same values are equal. `BloodType` is a value
/// object; `BloodUnit` (which has a `UnitId`) is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
