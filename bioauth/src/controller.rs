//! The [`AuthController`] owns the observable [`AuthState`] and exposes the
//! two user-facing commands: [`check_availability`] and [`authenticate`].
//!
//! [`check_availability`]: AuthController::check_availability
//! [`authenticate`]: AuthController::authenticate

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    adapter::Authenticator,
    config::PromptConfig,
    provider::{BiometricKind, BiometricProvider},
    result::BiometricResult,
    state::{AuthState, StateStore, Subscription},
};

/// Drives biometric authentication and publishes the resulting state.
///
/// The controller never fails. Every problem surfaces as
/// [`BiometricResult::Error`] in [`AuthState::last_result`].
pub struct AuthController<P> {
    authenticator: Authenticator<P>,
    prompt: PromptConfig,
    store: StateStore,
}

/// Finishes the in-flight attempt with [`BiometricResult::Error`] if the
/// [`AuthController::authenticate`] future is dropped before the native
/// prompt resolves. Otherwise `in_flight` would stay set forever.
struct AttemptGuard<'a> {
    store: &'a StateStore,
    finished: bool,
}

impl<P: BiometricProvider> AuthController<P> {
    pub fn new(provider: P, prompt: PromptConfig) -> Self {
        Self {
            authenticator: Authenticator::new(provider),
            prompt,
            store: StateStore::new(),
        }
    }

    #[inline]
    pub fn provider(&self) -> &P {
        self.authenticator.provider()
    }

    #[inline]
    pub fn prompt(&self) -> &PromptConfig {
        &self.prompt
    }

    /// The current state snapshot.
    #[inline]
    pub fn state(&self) -> AuthState {
        self.store.snapshot()
    }

    /// See [`StateStore::subscribe`].
    pub fn subscribe(
        &self,
        listener: impl Fn(&AuthState) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe(listener)
    }

    /// See [`StateStore::watch`].
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.store.watch()
    }

    #[inline]
    pub fn biometric_kind(&self) -> BiometricKind {
        self.authenticator.biometric_kind()
    }

    /// Query the provider and record whether biometrics are available.
    ///
    /// Safe to call repeatedly (e.g. every time the screen appears). Never
    /// touches `in_flight` or `last_result`. Concurrent checks are
    /// last-write-wins.
    #[instrument(skip_all, name = "(check-availability)")]
    pub async fn check_availability(&self) -> bool {
        let available = self.authenticator.is_available().await;
        info!(available, "Biometric availability checked");
        self.store.set_availability(available);
        available
    }

    /// Show the biometric prompt and record the result.
    ///
    /// If an attempt is already in flight, this is a no-op and returns `None`,
    /// so a double-tap can't stack two native prompts.
    #[instrument(skip_all, name = "(authenticate)")]
    pub async fn authenticate(&self) -> Option<BiometricResult> {
        if !self.store.try_begin_attempt() {
            debug!("Authentication already in flight; ignoring");
            return None;
        }

        let mut guard = AttemptGuard::new(&self.store);
        let result = self.authenticator.challenge(&self.prompt).await;
        guard.finish(result);

        Some(result)
    }
}

// --- impl AttemptGuard --- //

impl<'a> AttemptGuard<'a> {
    fn new(store: &'a StateStore) -> Self {
        Self {
            store,
            finished: false,
        }
    }

    fn finish(&mut self, result: BiometricResult) {
        self.finished = true;
        self.store.finish_attempt(result);
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Authentication dropped before the prompt resolved");
            self.store.finish_attempt(BiometricResult::Error);
        }
    }
}
