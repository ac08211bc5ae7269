//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// The arena indexes (`OrderBook`, `StockIndex`, the allocation ledger) key
/// their rows by `Entity::Id`, so every stored domain record implements this.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
