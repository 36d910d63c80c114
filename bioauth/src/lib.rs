//! Biometric authentication for the mobile app: a platform-agnostic
//! [`BiometricProvider`] capability, an [`Authenticator`] that turns its
//! callbacks into a single normalized [`BiometricResult`], and an
//! [`AuthController`] that publishes observable [`AuthState`] to the UI.
//!
//! The native prompt itself (Android `BiometricPrompt`, iOS `LAContext`) is
//! implemented by the host app and injected through the FFI layer in
//! `bioauth-uniffi`.

/// `Authenticator` and `ChallengeError`.
pub mod adapter;
/// Prompt copy and its TOML config.
pub mod config;
/// `AuthController`: the availability + authenticate commands.
pub mod controller;
/// Build-target provider selection and the hot-swappable `ProviderSlot`.
pub mod platform;
/// The `BiometricProvider` trait and `ChallengeCompletion`.
pub mod provider;
/// `BiometricResult` and the native code decoders.
pub mod result;
/// `AuthState` and its publish/subscribe store.
pub mod state;
/// A scripted fake provider.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
/// Presentation mapping from `AuthState` to what the screen shows.
pub mod view;

pub use adapter::{Authenticator, ChallengeError};
pub use config::PromptConfig;
pub use controller::AuthController;
pub use platform::ProviderSlot;
pub use provider::{BiometricKind, BiometricProvider, ChallengeCompletion};
pub use result::{BiometricResult, NativeOutcome};
pub use state::{AuthState, StateStore, Subscription};
pub use view::{AuthView, ResultMessage, Tone};
