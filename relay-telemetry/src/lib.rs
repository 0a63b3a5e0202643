//! Tracing initialization for relay binaries and tests.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

// A [`Once`] guards installation because `tracing` only accepts one global subscriber.
// While `init_tracing` is not called multiple times during normal operations, it is
// called once per test when tests run in the same process, so the guard is essential.
static INIT: Once = Once::new();

/// Initializes the global tracing subscriber with env-filter support.
///
/// Filter directives are read from `RUST_LOG`, falling back to `info` when the variable
/// is unset or invalid. Safe to call from multiple threads and multiple times; only the
/// first call installs the subscriber.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}
