//! Reservation orchestrator.
//!
//! Everything that needs more than one index to stay consistent happens
//! here: the demand-matching walk that binds arriving units to customer
//! orders, voyage population, lot reassignment with hold management, the
//! guarded lifecycle operations, and the downstream propagation of bindings
//! into outbound delivery reservations.
//!
//! Matching is two-phase: `matching::plan_receipt_load` is pure and
//! side-effect free, the orchestrator then applies a successful plan in one
//! go, so an aborted pass commits nothing.

pub mod matching;
pub mod orchestrator;
pub mod order;
pub mod propagate;

pub use matching::{LoadPlan, LoadUnit, PlannedBinding, PlannedLine, plan_receipt_load};
pub use orchestrator::{
    Orchestrator, ReassignOutcome, ReceiptLoadOutcome, DEFAULT_TRANSIT_DAYS,
};
pub use order::{
    ReservationBook, ReservationLine, ReservationOrder, ReservationOrderId, ReservationState,
};
pub use propagate::{propagate_receipt, PropagationOutcome};
