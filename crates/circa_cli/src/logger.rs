//! Logging setup for the CLI.
//!
//! Library crates log through `tracing` macros; this module installs the one
//! subscriber that prints them. Log lines go to stderr so command output on
//! stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// The filter is chosen in this order:
/// 1. `verbose`: debug level for circa crates
/// 2. `quiet`: errors only
/// 3. `RUST_LOG`, if set and valid
/// 4. info level for circa crates
pub fn init_logger(verbose: bool, quiet: bool, color: bool) {
    let filter = if verbose {
        EnvFilter::new("circa=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("circa=info"))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(color)
        .compact();

    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
