//! Shared tracing/logging setup for binaries and integration tests.
//!
//! Library crates only emit events; whoever owns `main` (or a test harness)
//! calls [`init`] once to install the subscriber.

/// Initialize process-wide tracing/logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
