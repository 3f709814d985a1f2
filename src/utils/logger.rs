//! Logging initialization.
//!
//! The crate itself only emits `tracing` events and never installs a
//! subscriber on its own; this helper is for binaries and test harnesses
//! that embed the executor and want logs on stderr.
//!
//! # Configuration
//!
//! The log level is controlled via the `RUST_LOG` environment variable:
//! - `RUST_LOG=debug` - Show debug and higher level logs
//! - `RUST_LOG=info` - Show info and higher level logs (default)
//! - `RUST_LOG=warn` - Show warnings and errors only

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize a stderr `tracing` subscriber.
///
/// The level defaults to `info` when `RUST_LOG` is not set. Calling this
/// more than once is harmless; later calls leave the existing subscriber
/// in place.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stderr keeps log lines out of any captured child output on stdout.
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("a tracing subscriber is already installed; keeping it");
    }
}
