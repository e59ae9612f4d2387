//! Tracing/logging initialization.
//!
//! JSON output with env-filter; correlation fields (order_id, request_id)
//! come from the spans/events the command pipeline emits.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging with the `info` baseline.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default_filter("info");
}

/// Initialize with an explicit fallback filter, still overridable via
/// `RUST_LOG`.
pub fn init_with_default_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
