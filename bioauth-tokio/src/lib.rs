//! Tokio utilities for running the biometric controller behind an FFI
//! boundary, where no caller-provided executor exists.

/// Building the dedicated runtime the FFI layer runs on.
pub mod runtime;
/// `BgTask`, `TaskSet`, and associated helpers.
pub mod task;

// Can save a `tokio` dependency declaration
pub use tokio;
