//! [`AuthState`] and the publish/subscribe [`StateStore`] that holds it.

use std::{
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use tokio::sync::watch;
use tracing::error;

use crate::result::BiometricResult;

/// A snapshot of the authentication state, as rendered by the UI.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AuthState {
    /// `None` until the first availability check completes.
    pub availability: Option<bool>,
    /// `true` strictly while a challenge is on screen.
    pub in_flight: bool,
    /// Cleared when a new challenge starts; set when it finishes.
    pub last_result: Option<BiometricResult>,
}

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Single-writer, many-reader store of [`AuthState`] snapshots.
///
/// Every mutation publishes a whole new snapshot. Listeners registered with
/// [`StateStore::subscribe`] see every snapshot strictly in mutation order.
/// Async consumers can use [`StateStore::watch`] instead, which only
/// guarantees they see the latest snapshot.
///
/// Notifications are queued while the mutation is applied and delivered
/// afterwards with no lock held, by whichever thread is currently draining
/// the queue. Without contention that's the mutating thread, before the
/// mutation returns. Listeners may call back into the store (e.g. subscribe
/// again); anything they cause is delivered after the current notification.
pub struct StateStore {
    shared: Arc<Shared>,
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

struct Shared {
    state_tx: watch::Sender<AuthState>,
    listeners: Mutex<Listeners>,
    /// Held across mutate + enqueue so the queue is in mutation order.
    outbox: Mutex<Outbox>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Outbox {
    pending: VecDeque<Notification>,
    /// Some thread is delivering `pending`.
    draining: bool,
}

/// A snapshot and the listeners registered when it was published.
struct Notification {
    snapshot: AuthState,
    targets: Vec<(u64, Listener)>,
}

// --- impl StateStore --- //

impl StateStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(AuthState::default());
        let shared = Shared {
            state_tx,
            listeners: Mutex::new(Listeners::default()),
            outbox: Mutex::new(Outbox::default()),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> AuthState {
        self.shared.state_tx.borrow().clone()
    }

    /// A [`watch::Receiver`] that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.shared.state_tx.subscribe()
    }

    /// Register `listener`. It's called with the current snapshot, then again
    /// after every mutation until the returned [`Subscription`] is dropped.
    ///
    /// When called from inside a listener, the first snapshot arrives once
    /// the current notification returns.
    pub fn subscribe(
        &self,
        listener: impl Fn(&AuthState) + Send + Sync + 'static,
    ) -> Subscription {
        let listener: Listener = Arc::new(listener);

        // Register and queue the current snapshot in one step so a concurrent
        // mutation can't slip in between and be seen out of order.
        let mut outbox = self.shared.outbox.lock().unwrap();
        let id = {
            let mut listeners = self.shared.listeners.lock().unwrap();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, listener.clone()));
            id
        };
        outbox.pending.push_back(Notification {
            snapshot: self.snapshot(),
            targets: vec![(id, listener)],
        });
        self.shared.drain(outbox);

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn num_listeners(&self) -> usize {
        self.shared.listeners.lock().unwrap().entries.len()
    }

    /// Record the result of an availability check.
    pub(crate) fn set_availability(&self, available: bool) {
        self.publish(|state| {
            state.availability = Some(available);
            true
        });
    }

    /// Start an attempt if none is in flight. Returns `false` (and publishes
    /// nothing) if one already is.
    pub(crate) fn try_begin_attempt(&self) -> bool {
        self.publish(|state| {
            if state.in_flight {
                return false;
            }
            state.in_flight = true;
            state.last_result = None;
            true
        })
    }

    /// Finish the in-flight attempt with `result`.
    pub(crate) fn finish_attempt(&self, result: BiometricResult) {
        self.publish(|state| {
            debug_assert!(state.in_flight, "No attempt in flight");
            state.in_flight = false;
            state.last_result = Some(result);
            true
        });
    }

    /// Apply `mutate` and, if it reports a change, notify every listener with
    /// the new snapshot.
    fn publish(&self, mutate: impl FnOnce(&mut AuthState) -> bool) -> bool {
        let mut outbox = self.shared.outbox.lock().unwrap();

        let mut snapshot = None;
        self.shared.state_tx.send_if_modified(|state| {
            let modified = mutate(state);
            if modified {
                snapshot = Some(state.clone());
            }
            modified
        });

        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => return false,
        };
        let targets = self.shared.listeners.lock().unwrap().entries.clone();
        outbox
            .pending
            .push_back(Notification { snapshot, targets });
        self.shared.drain(outbox);
        true
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &self.snapshot())
            .field("num_listeners", &self.num_listeners())
            .finish()
    }
}

// --- impl Shared --- //

impl Shared {
    /// Deliver queued notifications until the queue is empty, unless another
    /// thread (or an outer frame on this one) is already doing so.
    fn drain<'a>(&'a self, mut outbox: MutexGuard<'a, Outbox>) {
        if outbox.draining {
            return;
        }
        outbox.draining = true;

        loop {
            let notification = match outbox.pending.pop_front() {
                Some(notification) => notification,
                None => {
                    outbox.draining = false;
                    return;
                }
            };
            drop(outbox);

            for (id, listener) in &notification.targets {
                // Skip listeners unsubscribed since this was queued.
                if self.is_subscribed(*id) {
                    call_listener(listener, &notification.snapshot);
                }
            }

            outbox = self.outbox.lock().unwrap();
        }
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.listeners
            .lock()
            .unwrap()
            .entries
            .iter()
            .any(|(entry_id, _)| *entry_id == id)
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap()
            .entries
            .retain(|(entry_id, _)| *entry_id != id);
    }
}

fn call_listener(listener: &Listener, snapshot: &AuthState) {
    // A broken UI listener shouldn't poison the store for everyone else.
    let call = AssertUnwindSafe(|| listener(snapshot));
    if panic::catch_unwind(call).is_err() {
        error!("AuthState listener panicked");
    }
}

// --- impl Subscription --- //

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.unsubscribe(self.id);
        }
    }
}
