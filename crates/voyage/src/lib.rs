//! Shipment aggregate: one logistics movement and its transit lines.
//!
//! A `Voyage` owns its `TransitLine`s by composition and carries the
//! lifecycle state machine. Totals are recomputed from the lines on every
//! read; nothing aggregate-shaped is stored. Cross-entity rules (the
//! arrival guard, hold management, downstream propagation) live in the
//! reservation orchestrator, not here.

pub mod line;
pub mod voyage;

pub use line::{AllocationStatus, TransitLine, TransitLineId};
pub use voyage::{Voyage, VoyageId, VoyageStatus, VoyageTotals};
