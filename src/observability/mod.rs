//! Logging setup.
//!
//! Everything goes to stderr so `--stdout` output stays clean. `RUST_LOG`
//! takes precedence over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Calling it twice is harmless; the
/// first subscriber stays in place.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
