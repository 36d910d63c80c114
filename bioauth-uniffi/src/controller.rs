use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use bioauth::{
    AuthController, AuthState as AuthStateRs, AuthView as AuthViewRs,
    PromptConfig as PromptConfigRs, ProviderSlot,
    Subscription as SubscriptionRs,
};
use bioauth_tokio::{
    task::{BgTask, TaskSet},
    tokio::runtime::Runtime,
};
use tracing::{info, warn};

use crate::{
    error::FfiError,
    native::{NativeBiometrics, NativeProvider},
    types::{AuthState, AuthView, BiometricKind, PromptConfig},
};

/// How long [`BiometricController::shutdown`] waits for outstanding tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs [`UiTask`]s on the host's UI thread, in the order they're dispatched.
///
/// On Android, post to a main-thread `Handler`; on iOS, use
/// `DispatchQueue.main.async`. Both are FIFO.
#[uniffi::export(with_foreign)]
pub trait UiDispatcher: Send + Sync {
    /// Schedule `task.run()` on the UI thread. Must not block.
    fn dispatch(&self, task: Arc<UiTask>);
}

/// A unit of work for the UI thread. Only the first [`UiTask::run`] does
/// anything.
#[derive(uniffi::Object)]
pub struct UiTask {
    run: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

/// Receives every [`AuthState`] snapshot, in order, including the first one
/// delivered on [`BiometricController::subscribe`]. Always called through
/// the controller's [`UiDispatcher`], so it's safe to touch views directly.
///
/// Listeners may call back into the controller, e.g. to subscribe again.
#[uniffi::export(with_foreign)]
pub trait AuthStateListener: Send + Sync {
    fn on_state(&self, state: AuthState);
}

/// The screen-level controller. Owns a small runtime so that the foreign UI
/// thread can fire commands without blocking.
#[derive(uniffi::Object)]
pub struct BiometricController {
    inner: Arc<AuthController<ProviderSlot>>,
    dispatcher: Arc<dyn UiDispatcher>,
    tasks: TaskSet,
    runtime: Runtime,
}

/// Keeps an [`AuthStateListener`] registered until cancelled or released.
#[derive(uniffi::Object)]
pub struct AuthSubscription {
    inner: Mutex<Option<SubscriptionRs>>,
}

#[uniffi::export]
impl BiometricController {
    /// Create a controller with the platform's default provider. On Android
    /// and iOS, call [`install_provider`] before checking availability.
    ///
    /// State updates reach listeners through `dispatcher`.
    ///
    /// [`install_provider`]: BiometricController::install_provider
    #[uniffi::constructor]
    pub fn new(
        prompt: PromptConfig,
        dispatcher: Arc<dyn UiDispatcher>,
    ) -> Result<Arc<Self>, FfiError> {
        let prompt = PromptConfigRs::from(prompt);
        prompt.validate().map_err(FfiError::invalid_config)?;

        let runtime = bioauth_tokio::runtime::build("bioauth-rt")
            .map_err(|e| FfiError::Runtime(format!("{e:#}")))?;
        let controller =
            AuthController::new(ProviderSlot::platform_default(), prompt);

        Ok(Arc::new(Self {
            inner: Arc::new(controller),
            dispatcher,
            tasks: TaskSet::new(),
            runtime,
        }))
    }

    /// Install the host's native implementation. Challenges already showing
    /// keep running against the previous one.
    pub fn install_provider(&self, native: Arc<dyn NativeBiometrics>) {
        self.inner.provider().install(NativeProvider::new(native));
    }

    /// Re-check availability in the background. Call whenever the screen
    /// appears, since the user may have enrolled biometrics in the meantime.
    pub fn check_availability(&self) {
        let controller = self.inner.clone();
        self.spawn("check-availability", async move {
            controller.check_availability().await;
        });
    }

    /// Show the biometric prompt in the background. Ignored while a prompt
    /// is already showing. Observe the result via [`subscribe`] or [`state`].
    ///
    /// [`subscribe`]: BiometricController::subscribe
    /// [`state`]: BiometricController::state
    pub fn authenticate(&self) {
        let controller = self.inner.clone();
        self.spawn("authenticate", async move {
            controller.authenticate().await;
        });
    }

    pub fn state(&self) -> AuthState {
        AuthState::from(&self.inner.state())
    }

    pub fn view(&self) -> AuthView {
        AuthView::from(AuthViewRs::from(&self.inner.state()))
    }

    pub fn biometric_kind(&self) -> BiometricKind {
        self.inner.biometric_kind().into()
    }

    pub fn prompt(&self) -> PromptConfig {
        self.inner.prompt().clone().into()
    }

    /// Register `listener`. The current state is dispatched to it right away.
    pub fn subscribe(
        &self,
        listener: Arc<dyn AuthStateListener>,
    ) -> Arc<AuthSubscription> {
        let dispatcher = self.dispatcher.clone();
        let subscription = self.inner.subscribe(move |state: &AuthStateRs| {
            let listener = listener.clone();
            let state = AuthState::from(state);
            dispatcher.dispatch(UiTask::new(move || listener.on_state(state)));
        });
        Arc::new(AuthSubscription {
            inner: Mutex::new(Some(subscription)),
        })
    }

    /// Abort outstanding commands, e.g. when the screen is destroyed. An
    /// aborted authentication finishes as `Error`.
    pub fn shutdown(&self) {
        let result = self
            .runtime
            .block_on(self.tasks.abort_and_join(SHUTDOWN_TIMEOUT));
        match result {
            Ok(()) => info!("bioauth tasks finished."),
            Err(e) => warn!("bioauth tasks errored: {e:#}"),
        }
    }
}

impl BiometricController {
    fn spawn(
        &self,
        name: &'static str,
        future: impl Future<Output = ()> + Send + 'static,
    ) {
        let task = BgTask::spawn_on(self.runtime.handle(), name, future);
        self.tasks.push(task);
    }
}

#[uniffi::export]
impl UiTask {
    pub fn run(&self) {
        let run = self.run.lock().unwrap().take();
        if let Some(run) = run {
            run();
        }
    }
}

impl UiTask {
    fn new(run: impl FnOnce() + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            run: Mutex::new(Some(Box::new(run))),
        })
    }
}

#[uniffi::export]
impl AuthSubscription {
    /// Stop receiving updates. Idempotent.
    pub fn cancel(&self) {
        self.inner.lock().unwrap().take();
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            Weak,
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        thread,
    };

    use bioauth::result::android;

    use super::*;
    use crate::{native::ChallengeCompletion, types::BiometricResult};

    const UI_THREAD: &str = "test-ui";

    struct FakeNative {
        available: bool,
        pending: Mutex<Vec<Arc<ChallengeCompletion>>>,
        prompts: Mutex<Vec<PromptConfig>>,
    }

    impl FakeNative {
        fn new(available: bool) -> Arc<Self> {
            Arc::new(Self {
                available,
                pending: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn take_pending(&self) -> Arc<ChallengeCompletion> {
            self.pending.lock().unwrap().remove(0)
        }

        fn num_challenges(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl NativeBiometrics for FakeNative {
        fn is_available(&self) -> bool {
            self.available
        }

        fn biometric_kind(&self) -> BiometricKind {
            BiometricKind::Fingerprint
        }

        fn challenge(
            &self,
            prompt: PromptConfig,
            completion: Arc<ChallengeCompletion>,
        ) {
            self.prompts.lock().unwrap().push(prompt);
            self.pending.lock().unwrap().push(completion);
        }
    }

    /// A FIFO "main thread", like a `Looper` or the main `DispatchQueue`.
    struct UiThread {
        tx: Mutex<mpsc::Sender<Arc<UiTask>>>,
        dispatched: AtomicUsize,
    }

    impl UiThread {
        fn spawn() -> Arc<Self> {
            let (tx, rx) = mpsc::channel::<Arc<UiTask>>();
            thread::Builder::new()
                .name(UI_THREAD.to_owned())
                .spawn(move || {
                    for task in rx {
                        task.run();
                    }
                })
                .unwrap();
            Arc::new(Self {
                tx: Mutex::new(tx),
                dispatched: AtomicUsize::new(0),
            })
        }
    }

    impl UiDispatcher for UiThread {
        fn dispatch(&self, task: Arc<UiTask>) {
            self.dispatched.fetch_add(1, Ordering::SeqCst);
            let _ = self.tx.lock().unwrap().send(task);
        }
    }

    struct ChannelListener {
        tx: Mutex<mpsc::Sender<AuthState>>,
        calls: AtomicUsize,
        off_ui_thread: AtomicUsize,
    }

    impl ChannelListener {
        fn new() -> (Arc<Self>, mpsc::Receiver<AuthState>) {
            let (tx, rx) = mpsc::channel();
            let listener = Arc::new(Self {
                tx: Mutex::new(tx),
                calls: AtomicUsize::new(0),
                off_ui_thread: AtomicUsize::new(0),
            });
            (listener, rx)
        }
    }

    impl AuthStateListener for ChannelListener {
        fn on_state(&self, state: AuthState) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if thread::current().name() != Some(UI_THREAD) {
                self.off_ui_thread.fetch_add(1, Ordering::SeqCst);
            }
            let _ = self.tx.lock().unwrap().send(state);
        }
    }

    fn controller() -> (Arc<BiometricController>, Arc<UiThread>) {
        let ui = UiThread::spawn();
        let controller = BiometricController::new(
            crate::types::default_prompt_config(),
            ui.clone(),
        )
        .unwrap();
        (controller, ui)
    }

    fn listen(
        controller: &BiometricController,
    ) -> (mpsc::Receiver<AuthState>, Arc<AuthSubscription>) {
        let (listener, rx) = ChannelListener::new();
        let subscription = controller.subscribe(listener);
        (rx, subscription)
    }

    /// Block until a state matching `pred` arrives.
    fn wait_for(
        rx: &mpsc::Receiver<AuthState>,
        pred: impl Fn(&AuthState) -> bool,
    ) -> AuthState {
        loop {
            let state = rx
                .recv_timeout(Duration::from_secs(10))
                .expect("Timed out waiting for state");
            if pred(&state) {
                return state;
            }
        }
    }

    /// Spin until `cond` holds.
    fn eventually(cond: impl Fn() -> bool) {
        for _ in 0..1000 {
            if cond() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("Condition never held");
    }

    #[test]
    fn available_then_user_cancels() {
        bioauth_logger::init_for_testing();
        let (controller, _ui) = controller();
        let native = FakeNative::new(true);
        controller.install_provider(native.clone());
        assert_eq!(controller.biometric_kind(), BiometricKind::Fingerprint);

        let (rx, _sub) = listen(&controller);
        assert_eq!(controller.view(), AuthView::Checking);

        controller.check_availability();
        wait_for(&rx, |s| s.availability == Some(true));
        assert_eq!(
            controller.view(),
            AuthView::Ready {
                button_enabled: true,
                message: None,
            }
        );

        controller.authenticate();
        wait_for(&rx, |s| s.in_flight);
        native
            .take_pending()
            .fail_android(android::ERROR_NEGATIVE_BUTTON);
        let state = wait_for(&rx, |s| !s.in_flight);
        assert_eq!(state.last_result, Some(BiometricResult::UserCanceled));
        assert_eq!(controller.state(), state);
    }

    #[test]
    fn every_update_arrives_on_the_ui_thread() {
        let (controller, ui) = controller();
        let native = FakeNative::new(true);
        controller.install_provider(native.clone());

        let (listener, rx) = ChannelListener::new();
        let _sub = controller.subscribe(listener.clone());
        assert_eq!(wait_for(&rx, |_| true), AuthState {
            availability: None,
            in_flight: false,
            last_result: None,
        });

        controller.check_availability();
        wait_for(&rx, |s| s.availability == Some(true));
        controller.authenticate();
        wait_for(&rx, |s| s.in_flight);
        native.take_pending().succeed();
        wait_for(&rx, |s| s.last_result == Some(BiometricResult::Success));

        // Initial snapshot, availability, begin, finish.
        assert_eq!(listener.calls.load(Ordering::SeqCst), 4);
        assert_eq!(ui.dispatched.load(Ordering::SeqCst), 4);
        assert_eq!(listener.off_ui_thread.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_can_subscribe_again() {
        struct Resubscriber {
            controller: Weak<BiometricController>,
            nested: Arc<ChannelListener>,
            subs: Mutex<Vec<Arc<AuthSubscription>>>,
        }

        impl AuthStateListener for Resubscriber {
            fn on_state(&self, state: AuthState) {
                let mut subs = self.subs.lock().unwrap();
                if state.availability.is_none() || !subs.is_empty() {
                    return;
                }
                if let Some(controller) = self.controller.upgrade() {
                    subs.push(controller.subscribe(self.nested.clone()));
                }
            }
        }

        let (controller, _ui) = controller();
        controller.install_provider(FakeNative::new(true));
        let (nested, nested_rx) = ChannelListener::new();
        let _sub = controller.subscribe(Arc::new(Resubscriber {
            controller: Arc::downgrade(&controller),
            nested,
            subs: Mutex::new(Vec::new()),
        }));

        controller.check_availability();
        let state = wait_for(&nested_rx, |_| true);
        assert_eq!(state.availability, Some(true));

        // The store is still usable afterwards.
        let (rx, _sub2) = listen(&controller);
        controller.authenticate();
        wait_for(&rx, |s| s.in_flight);
        wait_for(&nested_rx, |s| s.in_flight);
    }

    #[test]
    fn double_tap_shows_one_prompt() {
        let (controller, _ui) = controller();
        let native = FakeNative::new(true);
        controller.install_provider(native.clone());
        let (rx, _sub) = listen(&controller);

        controller.authenticate();
        controller.authenticate();
        wait_for(&rx, |s| s.in_flight);
        // The second tap is dropped rather than queued behind the first.
        eventually(|| controller.tasks.num_running() == 1);
        assert_eq!(native.num_challenges(), 1);

        native.take_pending().succeed();
        let state = wait_for(&rx, |s| !s.in_flight);
        assert_eq!(state.last_result, Some(BiometricResult::Success));
        assert_eq!(native.num_challenges(), 1);
    }

    #[test]
    fn released_completion_is_an_error() {
        let (controller, _ui) = controller();
        let native = FakeNative::new(true);
        controller.install_provider(native.clone());
        let (rx, _sub) = listen(&controller);

        controller.authenticate();
        wait_for(&rx, |s| s.in_flight);
        drop(native.take_pending());

        let state = wait_for(&rx, |s| !s.in_flight);
        assert_eq!(state.last_result, Some(BiometricResult::Error));
    }

    #[test]
    fn shutdown_finishes_in_flight_attempt() {
        let (controller, _ui) = controller();
        let native = FakeNative::new(true);
        controller.install_provider(native.clone());
        let (rx, _sub) = listen(&controller);

        controller.authenticate();
        wait_for(&rx, |s| s.in_flight);
        controller.shutdown();

        assert_eq!(
            controller.state().last_result,
            Some(BiometricResult::Error)
        );
        assert!(!controller.state().in_flight);
        // The late native callback is ignored.
        assert!(native.take_pending().succeed());
        assert_eq!(
            controller.state().last_result,
            Some(BiometricResult::Error)
        );
    }

    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    #[test]
    fn desktop_default_is_unavailable() {
        let (controller, _ui) = controller();
        let (rx, _sub) = listen(&controller);

        controller.check_availability();
        wait_for(&rx, |s| s.availability == Some(false));
        assert!(matches!(controller.view(), AuthView::Unavailable { .. }));

        controller.authenticate();
        let state = wait_for(&rx, |s| s.last_result.is_some());
        assert_eq!(state.last_result, Some(BiometricResult::NotAvailable));
    }

    #[test]
    fn cancelled_subscription_stops_updates() {
        let (controller, _ui) = controller();
        let (rx, sub) = listen(&controller);
        assert_eq!(wait_for(&rx, |_| true), controller.state());

        sub.cancel();
        sub.cancel();
        controller.check_availability();
        eventually(|| controller.state().availability.is_some());
        // Give any stray dispatch a chance to land.
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ui_task_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let task = {
            let runs = runs.clone();
            UiTask::new(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            })
        };
        task.run();
        task.run();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejects_blank_prompt() {
        let prompt = PromptConfig {
            title: "  ".to_owned(),
            subtitle: String::new(),
            cancel_label: "Cancel".to_owned(),
        };
        let result = BiometricController::new(prompt, UiThread::spawn());
        assert!(matches!(result, Err(FfiError::InvalidConfig(_))));
    }
}
