//! Parties reference data (customers and vendors).
//!
//! The purchasing/selling collaborators own party records; this core consumes
//! them by id and only needs the name (for the allocation summary) and the
//! role flags.

pub mod directory;
pub mod party;

pub use directory::Directory;
pub use party::{Party, PartyId, PartyRole};
