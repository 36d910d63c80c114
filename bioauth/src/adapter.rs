//! [`Authenticator`] turns a callback-driven [`BiometricProvider`] into a
//! single awaitable call returning a [`BiometricResult`].

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    config::PromptConfig,
    provider::{BiometricKind, BiometricProvider, ChallengeCompletion},
    result::{BiometricResult, NativeOutcome},
};

/// Reasons a challenge can end without a native outcome.
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("Provider dropped the challenge without completing it")]
    Abandoned,
    #[error("Provider panicked while presenting the challenge")]
    ProviderPanicked,
}

/// Wraps a [`BiometricProvider`] and normalizes its results.
pub struct Authenticator<P> {
    provider: P,
}

impl<P: BiometricProvider> Authenticator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    #[inline]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    #[inline]
    pub fn biometric_kind(&self) -> BiometricKind {
        self.provider.biometric_kind()
    }

    /// Run one challenge and wait for the raw native outcome.
    ///
    /// Resolves exactly once: duplicate completions from the provider are
    /// discarded by [`ChallengeCompletion`], and a provider that loses its
    /// completion handle resolves as [`ChallengeError::Abandoned`] rather than
    /// hanging.
    pub async fn try_challenge(
        &self,
        prompt: &PromptConfig,
    ) -> Result<NativeOutcome, ChallengeError> {
        let (completion, outcome_rx) = ChallengeCompletion::new();

        // A native provider blowing up must not take the controller with it.
        // If it panics, `completion` is dropped while unwinding, so the
        // receiver below resolves immediately.
        let provider = &self.provider;
        let present = AssertUnwindSafe(move || {
            provider.challenge(prompt, completion)
        });
        if panic::catch_unwind(present).is_err() {
            error!("Biometric provider panicked in `challenge`");
            return Err(ChallengeError::ProviderPanicked);
        }

        outcome_rx.await.map_err(|_| ChallengeError::Abandoned)
    }

    /// Run one challenge and normalize its outcome. Never fails: anything that
    /// goes wrong is reported as [`BiometricResult::Error`].
    pub async fn challenge(&self, prompt: &PromptConfig) -> BiometricResult {
        match self.try_challenge(prompt).await {
            Ok(outcome) => {
                let result = outcome.result();
                info!(%result, "Biometric challenge finished: {outcome:?}");
                result
            }
            Err(err) => {
                warn!("Biometric challenge failed: {err:#}");
                BiometricResult::Error
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio_test::{assert_pending, assert_ready_eq};

    use super::*;
    use crate::{result::android, test_utils::FakeProvider};

    #[tokio::test]
    async fn normalizes_outcomes() {
        let cases = [
            (NativeOutcome::Success, BiometricResult::Success),
            (NativeOutcome::NegativeButton, BiometricResult::UserCanceled),
            (NativeOutcome::NotEnrolled, BiometricResult::NotAvailable),
            (NativeOutcome::Lockout, BiometricResult::Error),
        ];
        for (outcome, expected) in cases {
            let fake = FakeProvider::new().with_outcome(outcome);
            let auth = Authenticator::new(fake);
            let result = auth.challenge(&PromptConfig::default()).await;
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn waits_for_the_final_callback() {
        let fake = Arc::new(FakeProvider::new());
        let auth = Authenticator::new(fake.clone());
        let prompt = PromptConfig::default();

        let mut fut = tokio_test::task::spawn(auth.challenge(&prompt));
        assert_pending!(fut.poll());
        assert_eq!(fake.num_pending(), 1);

        // The user backs out of the prompt.
        assert!(fake.resolve_next(NativeOutcome::from_android_error(
            android::ERROR_USER_CANCELED
        )));
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), BiometricResult::UserCanceled);
    }

    #[tokio::test]
    async fn abandoned_challenge_resolves_as_error() {
        let fake = Arc::new(FakeProvider::new());
        let auth = Authenticator::new(fake.clone());
        let prompt = PromptConfig::default();

        let mut fut = tokio_test::task::spawn(auth.try_challenge(&prompt));
        assert_pending!(fut.poll());

        assert!(fake.abandon_next());
        match fut.poll() {
            std::task::Poll::Ready(Err(ChallengeError::Abandoned)) => (),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_provider_resolves_as_error() {
        struct Panicky;

        #[async_trait]
        impl BiometricProvider for Panicky {
            async fn is_available(&self) -> bool {
                true
            }

            fn challenge(
                &self,
                _prompt: &PromptConfig,
                _completion: ChallengeCompletion,
            ) {
                panic!("native layer exploded");
            }
        }

        let auth = Authenticator::new(Panicky);
        let result = auth.challenge(&PromptConfig::default()).await;
        assert_eq!(result, BiometricResult::Error);
    }

    #[tokio::test]
    async fn passes_prompt_through() {
        let fake =
            Arc::new(FakeProvider::new().with_outcome(NativeOutcome::Success));
        let auth = Authenticator::new(fake.clone());
        let prompt = PromptConfig {
            title: "Unlock".to_owned(),
            subtitle: String::new(),
            cancel_label: "Nope".to_owned(),
        };

        auth.challenge(&prompt).await;
        assert_eq!(fake.prompts(), vec![prompt]);
    }
}
