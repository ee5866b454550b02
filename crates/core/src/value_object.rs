//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Ingredient lines, rounding policies and rounding drift reports carry no
/// identity of their own. Two of them with the same attribute values are
/// interchangeable.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct IngredientLine { quantity_per_unit: f64, unit_cost: f64 }
///
/// impl ValueObject for IngredientLine {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
