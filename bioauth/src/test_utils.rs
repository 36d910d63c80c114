//! A scripted [`BiometricProvider`] for tests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    config::PromptConfig,
    provider::{BiometricKind, BiometricProvider, ChallengeCompletion},
    result::NativeOutcome,
};

/// A fake native provider.
///
/// By default challenges are held open until the test resolves them with
/// [`FakeProvider::resolve_next`], mimicking a modal prompt that waits on the
/// user. Use [`FakeProvider::with_outcome`] to complete them immediately
/// instead.
pub struct FakeProvider {
    available: AtomicBool,
    kind: BiometricKind,
    auto_outcome: Option<NativeOutcome>,
    pending: Mutex<VecDeque<ChallengeCompletion>>,
    prompts: Mutex<Vec<PromptConfig>>,
    num_checks: AtomicUsize,
}

impl FakeProvider {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(false),
            kind: BiometricKind::Generic,
            auto_outcome: None,
            pending: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            num_checks: AtomicUsize::new(0),
        }
    }

    pub fn with_available(self, available: bool) -> Self {
        self.set_available(available);
        self
    }

    pub fn with_kind(mut self, kind: BiometricKind) -> Self {
        self.kind = kind;
        self
    }

    /// Complete every challenge immediately with `outcome`.
    pub fn with_outcome(mut self, outcome: NativeOutcome) -> Self {
        self.auto_outcome = Some(outcome);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Complete the oldest pending challenge. Returns `false` if there was no
    /// pending challenge.
    pub fn resolve_next(&self, outcome: NativeOutcome) -> bool {
        let maybe_completion = self.pending.lock().unwrap().pop_front();
        match maybe_completion {
            Some(completion) => completion.complete(outcome),
            None => false,
        }
    }

    /// Drop the oldest pending challenge without completing it, as a native
    /// layer that loses its callback would.
    pub fn abandon_next(&self) -> bool {
        self.pending.lock().unwrap().pop_front().is_some()
    }

    pub fn num_pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Total number of challenges this provider was asked to show.
    pub fn num_challenges(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn num_checks(&self) -> usize {
        self.num_checks.load(Ordering::SeqCst)
    }

    /// The prompt copy of every challenge shown so far.
    pub fn prompts(&self) -> Vec<PromptConfig> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl BiometricProvider for FakeProvider {
    async fn is_available(&self) -> bool {
        self.num_checks.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }

    fn biometric_kind(&self) -> BiometricKind {
        self.kind
    }

    fn challenge(
        &self,
        prompt: &PromptConfig,
        completion: ChallengeCompletion,
    ) {
        self.prompts.lock().unwrap().push(prompt.clone());

        match &self.auto_outcome {
            Some(outcome) => {
                completion.complete(outcome.clone());
            }
            None => self.pending.lock().unwrap().push_back(completion),
        }
    }
}
