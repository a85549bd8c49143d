//! Tracing and structured logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// Call once from the binary entry point; safe to call again, subsequent
/// calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;


