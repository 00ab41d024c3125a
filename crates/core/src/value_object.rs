//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. `Money`
/// and `StockLevel` are the value objects of this system: two amounts of 1250
/// cents are the same amount, no matter where they came from.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
