//! Tracing/logging setup shared by tests and embedding binaries.
//!
//! The domain crates emit through the `tracing` macros only; wiring a
//! subscriber happens exactly once, here. The fail-soft paths of the
//! allocation core (unresolved quants, missing deliveries, stale-link
//! repairs) are only discoverable through these logs.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
