//! Selling and purchasing document contracts.
//!
//! The sale/purchase workflows live in external collaborators; this crate
//! models only the line-level data the allocation core consumes at that
//! boundary: demand lines with the "send for procurement" flag,
//! commitment lines with their received quantity, and the order headers they
//! hang off. `OrderBook` is the id-keyed index everything is looked up
//! through — no live object-graph traversal.

pub mod book;
pub mod purchase;
pub mod sale;

pub use book::OrderBook;
pub use purchase::{PurchaseLine, PurchaseLineId, PurchaseOrder, PurchaseOrderId, PurchaseState};
pub use sale::{
    HasProcurementGroup, ProcurementGroupId, SaleLine, SaleLineId, SaleOrder, SaleOrderId,
};
