//! `iceerp-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, date ranges, and the entity/value-object
//! markers the costing crate builds on.

pub mod entity;
pub mod error;
pub mod id;
pub mod range;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BatchId, ItemId};
pub use range::DateRange;
pub use value_object::ValueObject;
