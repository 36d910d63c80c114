//! # Kotlin/Swift FFI bindings
//!
//! All `#[uniffi::export]`ed items in this crate have corresponding
//! representations in the generated Kotlin and Swift code. Regenerate the
//! bindings after changing any of them:
//!
//! ```bash
//! $ cargo build -p bioauth-uniffi --release
//! $ cargo run -p bioauth-uniffi --features bindgen --bin uniffi-bindgen -- \
//!     generate --library target/release/libbioauth_ffi.so \
//!     --language kotlin --out-dir <out>
//! ```
//!
//! The types in [`types`] mirror the core `bioauth` types one-to-one, so the
//! core crate stays free of FFI concerns.

uniffi::setup_scaffolding!("bioauth");

/// `BiometricController` and how its state reaches the UI thread.
pub mod controller;
/// `FfiError`.
pub mod error;
/// Pipe `tracing` log messages from Rust to the host.
pub mod logger;
/// `NativeBiometrics` and `ChallengeCompletion`.
pub mod native;
/// FFI mirror types.
pub mod types;
