//! Tracing setup for hosts embedding the core library.
//!
//! The library never installs a subscriber on its own. A native host calls
//! [`init`] (or `init_logging` over FFI) once at startup; events from the
//! record store then go to stderr in compact form, filtered by `RUST_LOG`.
//!
//! Initialization goes through `try_init`. A subscriber already installed by
//! the host, or by an earlier call, stays in place.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at INFO unless RUST_LOG says otherwise.
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level.
///
/// RUST_LOG still takes precedence. Later calls leave the first subscriber
/// in place.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Debug-level logging routed through the test harness writer.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
