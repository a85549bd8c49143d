//! Tracing/logging initialization.
//!
//! JSON lines on stdout, filtered via `RUST_LOG`. Dispatch runs log under a
//! per-run span in `tradeloom-engine`; `RUST_LOG=tradeloom_engine=trace`
//! shows every queue pop and fold.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}


