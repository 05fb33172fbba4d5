//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initialize a global tracing subscriber with env-filter support
/// (`RUST_LOG=dsc_engine=debug`). Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .try_init();
}
