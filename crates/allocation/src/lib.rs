//! Allocation ledger: sale-demand to purchase-commitment links.
//!
//! An `AllocationRecord` commits part of a purchase line to one sale line
//! and tracks how much of that commitment has physically arrived. The
//! `AllocationLedger` owns every record, keeps them in creation order (the
//! demand-matching walk depends on it) and hosts the consolidation command
//! that turns open demand into purchase lines plus records.

pub mod ledger;
pub mod record;

pub use ledger::{AllocationLedger, AllocationSummary, ConsolidationTarget};
pub use record::{AllocationId, AllocationRecord, AllocationState};
