//! Rust logger integration.

use std::sync::Arc;

use bioauth_logger::LogSink as LogSinkRs;

/// Receives formatted Rust log lines, e.g. to print them with
/// `android.util.Log` or `os_log`.
#[uniffi::export(with_foreign)]
pub trait LogSink: Send + Sync {
    fn log(&self, line: String);
}

struct ForeignLogSink(Arc<dyn LogSink>);

impl LogSinkRs for ForeignLogSink {
    fn log(&self, line: String) {
        self.0.log(line)
    }
}

/// Init the Rust [`tracing`] logger, shipping formatted log lines to `sink`.
///
/// Since `println!`/stdout gets swallowed on mobile, this is the only way to
/// see Rust logs while developing.
///
/// Unlike our other Rust loggers, this init will _not_ panic if a logger
/// instance is already set. Instead it will just swap in the new `sink`, so
/// a recreated Activity or scene can re-register.
///
/// `rust_log`: since env vars don't work well on mobile, we need to ship the
/// equivalent of `$RUST_LOG` configured at build-time through here.
///
/// Returns `false` if another Rust logger was installed first, in which case
/// `sink` will never be called.
#[uniffi::export]
pub fn init_rust_log_stream(
    sink: Arc<dyn LogSink>,
    rust_log: String,
) -> bool {
    bioauth_logger::init_with_sink(ForeignLogSink(sink), &rust_log)
}
