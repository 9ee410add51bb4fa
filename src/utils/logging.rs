//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber writing compact lines to stderr
///
/// `RUST_LOG` wins over `level` when set. Calling this more than once is a
/// no-op.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
