//! The host's native biometric implementation, and the completion handle it
//! reports back through.

use std::sync::Arc;

use async_trait::async_trait;
use bioauth::{
    BiometricKind as BiometricKindRs, BiometricProvider,
    ChallengeCompletion as ChallengeCompletionRs,
    PromptConfig as PromptConfigRs,
};

use crate::types::{BiometricKind, PromptConfig};

/// Implemented in Kotlin over `androidx.biometric.BiometricPrompt` and in
/// Swift over `LAContext`.
#[uniffi::export(with_foreign)]
pub trait NativeBiometrics: Send + Sync {
    /// Whether a strong biometric is enrolled and usable right now. Must not
    /// show any UI.
    fn is_available(&self) -> bool;

    fn biometric_kind(&self) -> BiometricKind;

    /// Show the system prompt and return immediately. Report the final
    /// outcome through exactly one of `completion`'s completing methods, from
    /// any thread.
    ///
    /// Called on a Rust worker thread, not the UI thread. Post to the main
    /// thread before calling `BiometricPrompt.authenticate` on Android.
    fn challenge(
        &self,
        prompt: PromptConfig,
        completion: Arc<ChallengeCompletion>,
    );
}

/// Handed to [`NativeBiometrics::challenge`]. Only the first completion
/// counts. Releasing it without completing resolves the challenge as an
/// error.
#[derive(uniffi::Object)]
pub struct ChallengeCompletion {
    inner: ChallengeCompletionRs,
}

#[uniffi::export]
impl ChallengeCompletion {
    /// `onAuthenticationSucceeded` / `evaluatePolicy` returned `true`.
    pub fn succeed(&self) -> bool {
        self.inner.succeed()
    }

    /// `onAuthenticationError(errorCode, ..)`
    pub fn fail_android(&self, code: i32) -> bool {
        self.inner.fail_android(code)
    }

    /// `LAError.Code.rawValue`
    pub fn fail_ios(&self, code: i64) -> bool {
        self.inner.fail_ios(code)
    }

    /// A string result code like `"USER_CANCELED"`.
    pub fn complete_code(&self, code: String) -> bool {
        self.inner.complete_code(&code)
    }

    /// `onAuthenticationFailed`: a rejected but non-final attempt.
    pub fn attempt_failed(&self) {
        self.inner.attempt_failed()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.is_completed()
    }
}

/// Adapts a foreign [`NativeBiometrics`] into a [`BiometricProvider`].
pub(crate) struct NativeProvider {
    native: Arc<dyn NativeBiometrics>,
}

impl NativeProvider {
    pub(crate) fn new(native: Arc<dyn NativeBiometrics>) -> Self {
        Self { native }
    }
}

#[async_trait]
impl BiometricProvider for NativeProvider {
    async fn is_available(&self) -> bool {
        self.native.is_available()
    }

    fn biometric_kind(&self) -> BiometricKindRs {
        self.native.biometric_kind().into()
    }

    fn challenge(
        &self,
        prompt: &PromptConfigRs,
        completion: ChallengeCompletionRs,
    ) {
        let completion = Arc::new(ChallengeCompletion { inner: completion });
        self.native
            .challenge(PromptConfig::from(prompt.clone()), completion)
    }
}
