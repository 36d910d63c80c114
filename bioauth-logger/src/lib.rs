//! Logger configuration for the biometric bridge.
//!
//! + [`init`] / [`try_init`] / [`init_for_testing`]: print to stdout. For
//!   desktop builds and tests.
//! + [`init_with_sink`]: forward formatted log lines to the host app through a
//!   [`LogSink`]. On Android and iOS stdout goes nowhere, so this is the only
//!   way to see Rust logs in logcat / the Xcode console.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    filter::Targets,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

/// Forward formatted `tracing` events to the host app.
pub mod sink;

pub use sink::{LogSink, init_with_sink};

/// Initialize a global `tracing` logger.
///
/// + The logger will print enabled `tracing` events and spans to stdout.
/// + The default log level includes INFO, WARN, and ERROR events.
/// + You can change the log level or module filtering with an appropriate
///   `RUST_LOG` env var set. Read more about the syntax here:
///   <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.Targets.html>
///
/// Panics if a logger is already initialized. This will fail if used in tests,
/// since multiple test threads will compete to set the global logger.
pub fn init() {
    try_init().expect("Failed to setup logger");
}

/// Use this to initialize the global logger in tests.
pub fn init_for_testing() {
    // Quickly skip logger setup if no env var set.
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    // Don't panic if there's already a logger setup. Multiple tests might try
    // setting the global logger.
    let _ = try_init();
}

/// Try to initialize a global logger. Will return an `Err` if there is another
/// global logger already set.
pub fn try_init() -> Result<(), TryInitError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let rust_log_filter = targets_filter(rust_log.as_deref());

    let stdout_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_level(true)
        .with_target(true)
        .with_ansi(true)
        .with_filter(rust_log_filter);

    tracing_subscriber::registry().with(stdout_log).try_init()
}

/// Parse a `RUST_LOG`-style targets filter. Defaults to INFO logs if
/// `rust_log` is missing or we can't parse it.
pub(crate) fn targets_filter(rust_log: Option<&str>) -> Targets {
    rust_log
        .and_then(|rust_log| Targets::from_str(rust_log).ok())
        .unwrap_or_else(|| Targets::new().with_default(Level::INFO))
}
