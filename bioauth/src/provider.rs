//! The [`BiometricProvider`] trait implemented by each platform's native
//! biometric subsystem, and the one-shot [`ChallengeCompletion`] it reports
//! back through.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{config::PromptConfig, result::NativeOutcome};

/// A platform's biometric capability: an availability check plus a single
/// modal challenge.
///
/// Implementations live on the native side (Android `BiometricPrompt`, iOS
/// `LAContext`) and are injected at startup. See [`crate::platform`] for the
/// build-target defaults.
#[async_trait]
pub trait BiometricProvider: Send + Sync {
    /// Whether the device currently has an enrolled, usable biometric of at
    /// least "strong" (class 3) security. Must not prompt the user.
    async fn is_available(&self) -> bool;

    /// Which biometric the device uses, for display purposes.
    fn biometric_kind(&self) -> BiometricKind {
        BiometricKind::Generic
    }

    /// Show the native prompt. The provider must eventually call one of the
    /// completing methods on `completion` exactly once. Non-final failed
    /// attempts which the platform retries internally must go through
    /// [`ChallengeCompletion::attempt_failed`] instead.
    ///
    /// Dropping `completion` without completing it resolves the challenge as
    /// an error.
    fn challenge(&self, prompt: &PromptConfig, completion: ChallengeCompletion);
}

/// The kind of biometric hardware a device uses.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum BiometricKind {
    FaceId,
    TouchId,
    Fingerprint,
    #[default]
    Generic,
}

/// A one-shot handle that resolves a pending challenge.
///
/// Only the first completion counts. Later completions are ignored and logged,
/// since some native layers are known to fire their callbacks more than once.
pub struct ChallengeCompletion {
    tx: Mutex<Option<oneshot::Sender<NativeOutcome>>>,
}

// --- impl BiometricKind --- //

impl BiometricKind {
    /// Human-readable name, e.g. for an "Authenticate with Face ID" button.
    pub fn label(self) -> &'static str {
        match self {
            Self::FaceId => "Face ID",
            Self::TouchId => "Touch ID",
            Self::Fingerprint => "Fingerprint",
            Self::Generic => "Biometric Authentication",
        }
    }

    /// e.g. "Authenticate with Face ID"
    pub fn button_label(self) -> String {
        format!("Authenticate with {}", self.label())
    }
}

// --- impl ChallengeCompletion --- //

impl ChallengeCompletion {
    /// Create a new completion handle along with the receiver the adapter
    /// awaits on.
    pub(crate) fn new() -> (Self, oneshot::Receiver<NativeOutcome>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            tx: Mutex::new(Some(tx)),
        };
        (completion, rx)
    }

    /// Resolve the challenge with `outcome`. Returns `false` if the challenge
    /// was already resolved, in which case `outcome` is discarded.
    pub fn complete(&self, outcome: NativeOutcome) -> bool {
        let maybe_tx = self.tx.lock().unwrap().take();
        let tx = match maybe_tx {
            Some(tx) => tx,
            None => {
                warn!("Ignoring duplicate challenge completion: {outcome:?}");
                return false;
            }
        };

        debug!("Challenge completed: {outcome:?}");
        if tx.send(outcome).is_err() {
            // The waiting side went away; nothing left to resolve.
            debug!("Challenge completed after its waiter was dropped");
        }
        true
    }

    #[inline]
    pub fn succeed(&self) -> bool {
        self.complete(NativeOutcome::Success)
    }

    /// Resolve with an Android `BiometricPrompt.ERROR_*` code.
    #[inline]
    pub fn fail_android(&self, code: i32) -> bool {
        self.complete(NativeOutcome::from_android_error(code))
    }

    /// Resolve with an iOS `LAError.Code` raw value.
    #[inline]
    pub fn fail_ios(&self, code: i64) -> bool {
        self.complete(NativeOutcome::from_ios_error(code))
    }

    /// Resolve with a bridge string code, e.g. `"USER_CANCELED"`.
    #[inline]
    pub fn complete_code(&self, code: &str) -> bool {
        self.complete(NativeOutcome::from_code(code))
    }

    /// Record a non-final failed attempt (e.g. Android's
    /// `onAuthenticationFailed`). The prompt stays up and the challenge stays
    /// pending.
    pub fn attempt_failed(&self) {
        debug!("Biometric attempt rejected; waiting for the final outcome");
    }

    /// Whether this challenge has already been resolved.
    pub fn is_completed(&self) -> bool {
        self.tx.lock().unwrap().is_none()
    }
}

#[async_trait]
impl<P: BiometricProvider + ?Sized> BiometricProvider for Arc<P> {
    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    fn biometric_kind(&self) -> BiometricKind {
        (**self).biometric_kind()
    }

    fn challenge(
        &self,
        prompt: &PromptConfig,
        completion: ChallengeCompletion,
    ) {
        (**self).challenge(prompt, completion)
    }
}

#[async_trait]
impl<P: BiometricProvider + ?Sized> BiometricProvider for Box<P> {
    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    fn biometric_kind(&self) -> BiometricKind {
        (**self).biometric_kind()
    }

    fn challenge(
        &self,
        prompt: &PromptConfig,
        completion: ChallengeCompletion,
    ) {
        (**self).challenge(prompt, completion)
    }
}
