//! Product reference data.
//!
//! Estimated costs and prices are read-only pass-through here: this core
//! never computes pricing, it only copies the agreed (preferred) or list
//! price onto reservation lines.

pub mod catalog;
pub mod product;

pub use catalog::Catalog;
pub use product::{Pricing, Product, ProductId};
