//! `controltower-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, the explicit execution context
//! every orchestrated operation receives, and quantity arithmetic with the
//! allocation tolerance.

pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod qty;

pub use context::ExecutionContext;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, RecordId, UserId};
pub use qty::{QTY_TOLERANCE, Qty, clamp_received, wants_more};
