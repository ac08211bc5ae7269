//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// These are the *blocking* failures of the allocation core: user-correctable
/// validation problems and violated invariants. Fail-soft conditions (a quant
/// that cannot be resolved, a missing outbound delivery) are not errors — they
/// are logged and the operation continues, so they never appear here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed validation (e.g. a customer without an order, no eligible
    /// demand lines to consolidate).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant would be violated (e.g. closing a voyage whose
    /// warehouse receipt is still open).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist in the relevant index.
    #[error("not found")]
    NotFound,

    /// A conflicting record already exists (e.g. an active hold on the same
    /// physical unit). Losers of a reservation race observe this and retry.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
