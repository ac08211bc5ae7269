//! Demand board: what still needs to be bought, per product.

pub mod board;

pub use board::{overview, DemandDetail, DemandRow};
