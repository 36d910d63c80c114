//! Build-target provider selection.
//!
//! * **Android + iOS:** the real provider lives in the host app (Kotlin over
//!   `BiometricPrompt`, Swift over `LAContext`) and is installed into a
//!   [`ProviderSlot`] once the host has an `Activity`/`UIViewController` to
//!   present from. Until then the slot holds [`Uninitialized`].
//! * **Everything else:** [`Unsupported`]. Desktop builds are only used for
//!   development and tests.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use cfg_if::cfg_if;
use tracing::{info, warn};

use crate::{
    config::PromptConfig,
    provider::{BiometricKind, BiometricProvider, ChallengeCompletion},
    result::NativeOutcome,
};

/// Provider for targets without any biometric subsystem. Never available;
/// every challenge completes immediately with [`NativeOutcome::NoHardware`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Unsupported;

/// Placeholder provider for a mobile target whose native provider hasn't been
/// installed yet. Never available; challenges are dropped without completing,
/// which the adapter resolves as an error.
#[derive(Copy, Clone, Debug, Default)]
pub struct Uninitialized;

/// A [`BiometricProvider`] that delegates to a swappable inner provider.
///
/// Lets the host construct the controller early and install the native
/// provider later (e.g. from `MainActivity.onCreate`).
pub struct ProviderSlot {
    current: ArcSwap<Box<dyn BiometricProvider>>,
}

/// The default provider for the current build target.
pub fn default_provider() -> Box<dyn BiometricProvider> {
    cfg_if! {
        if #[cfg(any(target_os = "android", target_os = "ios"))] {
            Box::new(Uninitialized)
        } else {
            Box::new(Unsupported)
        }
    }
}

// --- impl Unsupported --- //

#[async_trait]
impl BiometricProvider for Unsupported {
    async fn is_available(&self) -> bool {
        false
    }

    fn challenge(
        &self,
        _prompt: &PromptConfig,
        completion: ChallengeCompletion,
    ) {
        completion.complete(NativeOutcome::NoHardware);
    }
}

// --- impl Uninitialized --- //

#[async_trait]
impl BiometricProvider for Uninitialized {
    async fn is_available(&self) -> bool {
        false
    }

    fn challenge(
        &self,
        _prompt: &PromptConfig,
        completion: ChallengeCompletion,
    ) {
        warn!("Biometric challenge requested before a provider was installed");
        drop(completion);
    }
}

// --- impl ProviderSlot --- //

impl ProviderSlot {
    pub fn new(provider: impl BiometricProvider + 'static) -> Self {
        let provider: Box<dyn BiometricProvider> = Box::new(provider);
        Self {
            current: ArcSwap::from_pointee(provider),
        }
    }

    /// A slot holding the [`default_provider`] for this build target.
    pub fn platform_default() -> Self {
        Self {
            current: ArcSwap::from_pointee(default_provider()),
        }
    }

    /// Replace the current provider. Challenges already in progress keep
    /// running against the provider they started with.
    pub fn install(&self, provider: impl BiometricProvider + 'static) {
        let provider: Box<dyn BiometricProvider> = Box::new(provider);
        self.current.store(Arc::new(provider));
        info!("Installed biometric provider");
    }

    fn load(&self) -> Arc<Box<dyn BiometricProvider>> {
        self.current.load_full()
    }
}

impl Default for ProviderSlot {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[async_trait]
impl BiometricProvider for ProviderSlot {
    async fn is_available(&self) -> bool {
        // Hold our own handle across the await so a concurrent `install`
        // can't pull the provider out from under us.
        let provider = self.load();
        provider.is_available().await
    }

    fn biometric_kind(&self) -> BiometricKind {
        self.current.load().biometric_kind()
    }

    fn challenge(
        &self,
        prompt: &PromptConfig,
        completion: ChallengeCompletion,
    ) {
        self.load().challenge(prompt, completion)
    }
}
