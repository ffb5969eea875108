//! Tracing setup for binaries and integration harnesses embedding the
//! crate.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG`, defaulting to `info` for this crate.
/// Safe to call more than once; only the first call installs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campus_scheduling=info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
