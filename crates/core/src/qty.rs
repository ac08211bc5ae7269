//! Quantity arithmetic and the allocation tolerance.
//!
//! Quantities are decimal (fractional units such as m² are first-class).
//! The tolerance guards the demand-matching walk against rounding noise:
//! a demand is "still unmet" only while the assigned total sits more than
//! `QTY_TOLERANCE` below the ordered quantity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Quantity of product, in the product's unit of measure.
pub type Qty = Decimal;

/// Rounding guard for the tolerance-up comparison (0.001 of a unit).
pub const QTY_TOLERANCE: Qty = dec!(0.001);

/// Whether a demand with `ordered` quantity still wants more material after
/// `assigned` has been put against it.
///
/// This is the tolerance-up predicate: while it holds, the *next whole unit*
/// is assigned to the demand even if that overshoots, so a customer never
/// receives a split physical unit.
pub fn wants_more(assigned: Qty, ordered: Qty) -> bool {
    assigned < ordered - QTY_TOLERANCE
}

/// Clamp a cumulative received quantity to the committed quantity.
pub fn clamp_received(received: Qty, committed: Qty) -> Qty {
    if received > committed { committed } else { received }
}
