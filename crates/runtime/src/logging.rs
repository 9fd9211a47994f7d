//! Tracing subscriber setup
//!
//! Events go to stderr so they never interleave with program output on
//! stdout. The filter comes from `KK_LOG` (see `config.rs`).

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber; later calls are no-ops
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("Warning: invalid log filter '{}': {}", filter, err);
        EnvFilter::new(crate::config::DEFAULT_LOG_FILTER)
    });

    // Already installed by an earlier init or by an embedding host
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
