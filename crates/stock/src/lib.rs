//! Physical stock layer contracts.
//!
//! The warehouse move/transfer engine is an external collaborator; this
//! crate models the records the allocation core reads and writes at that
//! boundary: lots, locations, quants (physical stock units), inbound
//! receipts, outbound deliveries, and customer holds. `StockIndex` is the
//! id-keyed index over all of them, including the quant-recovery queries the
//! reservation orchestrator relies on.

pub mod delivery;
pub mod hold;
pub mod index;
pub mod location;
pub mod lot;
pub mod quant;
pub mod receipt;

pub use delivery::{Delivery, DeliveryId, DeliveryLine, DeliveryState, LotReservation};
pub use hold::{Hold, HoldId, HoldState};
pub use index::StockIndex;
pub use location::{Location, LocationId, LocationUsage};
pub use lot::{Lot, LotId};
pub use quant::{Quant, QuantId};
pub use receipt::{Receipt, ReceiptId, ReceiptLine, ReceiptState};
