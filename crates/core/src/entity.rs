//! Entity trait: identity that survives re-reads from the backing store.

/// Entity marker + minimal interface.
///
/// Items, bills of materials and production batches are all re-fetched from the
/// hosted store on every query; two copies with the same id describe the same
/// record even if their field values differ between reads.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
