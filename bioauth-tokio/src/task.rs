use std::{
    borrow::Cow,
    fmt::{self, Display},
    future::Future,
    pin::Pin,
    sync::Mutex,
    task::{Context, Poll},
    time::Duration,
};

use futures::{StreamExt, stream::FuturesUnordered};
use thiserror::Error;
use tokio::{
    runtime::Handle,
    task::{JoinError, JoinHandle},
};
use tracing::{Instrument, debug, error, info, warn};

/// Errors that can occur when joining [`BgTask`]s.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Some tasks failed to finish on time: {hung_tasks:?}")]
    Hung { hung_tasks: Vec<String> },
}

/// A thin wrapper around [`tokio::task::JoinHandle`] that:
///
/// (1) propagates panics instead of catching them
/// (2) adds the `#[must_use]` lint to ensure that all spawned tasks are joined,
///     tracked in a [`TaskSet`], or explicitly [`detach`]ed.
/// (3) carries a task name for debuggability. Use [`BgTask::logged`] to log
///     the name and status when the task finishes.
///
/// [`detach`]: BgTask::detach
#[must_use]
pub struct BgTask<T> {
    task: JoinHandle<T>,
    name: Cow<'static, str>,
}

/// A [`Future`] that wraps [`BgTask`] so its result is logged when it finishes.
/// The inner `T` is discarded and the [`Future::Output`] is mapped to its name.
pub struct LoggedBgTask<T>(BgTask<T>);

/// Keeps handles to fire-and-forget tasks so they can be aborted and joined
/// at shutdown. Finished tasks are reaped whenever a new one is added.
#[derive(Default)]
pub struct TaskSet {
    tasks: Mutex<Vec<BgTask<()>>>,
}

// Provides a [`Display`] impl for the result of a finished task.
struct TaskOutputDisplay<'a> {
    name: &'a str,
    // Convert a task output to this using `result.as_ref().map(|_| ())`.
    result: Result<(), &'a JoinError>,
}

/// Wait for all `tasks` to finish, up to `timeout`. Each task's result is
/// logged as it finishes.
///
/// Returns [`Error::Hung`] with the names of any stragglers.
pub async fn try_join_all(
    tasks: Vec<BgTask<()>>,
    timeout: Duration,
) -> Result<(), Error> {
    let mut all_tasks = tasks
        .into_iter()
        .map(BgTask::logged)
        .collect::<FuturesUnordered<_>>();

    let timeout_fut = tokio::time::sleep(timeout);
    tokio::pin!(timeout_fut);

    while !all_tasks.is_empty() {
        tokio::select! {
            Some(_name) = all_tasks.next() => (),
            () = &mut timeout_fut => {
                let hung_tasks = all_tasks
                    .iter()
                    .map(|task| task.name().to_owned())
                    .collect::<Vec<_>>();

                return Err(Error::Hung { hung_tasks });
            }
        }
    }

    Ok(())
}

// --- impl BgTask --- //

impl<T> BgTask<T> {
    /// Spawns a named task on the current runtime, inheriting the current
    /// span.
    #[inline]
    pub fn spawn<F>(
        name: impl Into<Cow<'static, str>>,
        future: F,
    ) -> BgTask<F::Output>
    where
        F: Future<Output = T> + Send + 'static,
        F::Output: Send + 'static,
    {
        Self::spawn_on(&Handle::current(), name, future)
    }

    /// Spawns a named task on the runtime behind `handle`, inheriting the
    /// current span. Unlike [`BgTask::spawn`], this can be called from a
    /// thread that isn't inside any runtime, like an FFI caller's UI thread.
    #[inline]
    pub fn spawn_on<F>(
        handle: &Handle,
        name: impl Into<Cow<'static, str>>,
        future: F,
    ) -> BgTask<F::Output>
    where
        F: Future<Output = T> + Send + 'static,
        F::Output: Send + 'static,
    {
        // Instrument the future so that the current tracing span propagates
        // past spawn boundaries.
        let span = tracing::Span::current();
        let name = name.into();
        debug!("Spawning task: {name}");
        Self {
            task: handle.spawn(future.instrument(span)),
            name,
        }
    }

    /// Drop the task handle, detaching it so it continues running in the
    /// background. Prefer tracking the task in a [`TaskSet`].
    #[inline]
    pub fn detach(self) {
        std::mem::drop(self)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls [`is_finished`] on the underlying [`JoinHandle`].
    ///
    /// [`is_finished`]: tokio::task::JoinHandle::is_finished
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Instrument a [`BgTask`] so that its result is logged when it finishes.
    /// The [`BgTask`]'s [`Future::Output`] is also mapped to the task name.
    #[inline]
    pub fn logged(self) -> LoggedBgTask<T> {
        LoggedBgTask(self)
    }

    #[inline]
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl<T> Future for BgTask<T> {
    type Output = Result<T, JoinError>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Self::Output> {
        let result = match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };

        let result = match result {
            Ok(val) => Ok(val),
            Err(join_err) => match join_err.try_into_panic() {
                // If the inner spawned task panicked, then propagate the
                // panic to the `BgTask` poller.
                Ok(panic_reason) => {
                    error!("Task '{name}' panicked!", name = self.name());
                    std::panic::resume_unwind(panic_reason)
                }
                Err(join_err) => Err(join_err),
            },
        };

        Poll::Ready(result)
    }
}

// --- impl LoggedBgTask --- //

impl<T> LoggedBgTask<T> {
    #[inline]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl<T> Future for LoggedBgTask<T> {
    type Output = Cow<'static, str>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Self::Output> {
        // Poll the raw `JoinHandle` so panics are logged here instead of
        // being resumed.
        Pin::new(&mut self.0.task).poll(cx).map(|result| {
            let msg = TaskOutputDisplay {
                name: self.name(),
                result: result.as_ref().map(|_| ()),
            };

            match &result {
                Ok(_) => info!("{msg}"),
                Err(e) if e.is_panic() => error!("{msg}"),
                Err(_) => warn!("{msg}"),
            }

            self.0.name.clone()
        })
    }
}

// --- impl TaskSet --- //

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `task`, dropping handles to any tasks that already finished.
    pub fn push(&self, task: BgTask<()>) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// The number of tracked tasks which haven't finished yet.
    pub fn num_running(&self) -> usize {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Abort every tracked task, then wait up to `timeout` for them to wind
    /// down. Aborting drops each task's future, which runs its destructors.
    pub async fn abort_and_join(&self, timeout: Duration) -> Result<(), Error> {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
        for task in &tasks {
            task.abort();
        }
        try_join_all(tasks, timeout).await
    }
}

// --- impl TaskOutputDisplay --- //

impl Display for TaskOutputDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join_label = match &self.result {
            Ok(_) => "finished",
            Err(e) if e.is_cancelled() => "cancelled",
            Err(e) if e.is_panic() => "panicked",
            _ => "(unknown join error)",
        };

        // "Task '<name>' <finished|cancelled|panicked>: [<error>]"
        let name = self.name;
        write!(f, "Task '{name}' {join_label}")?;

        if let Err(e) = self.result {
            write!(f, ": {e:#}")?;
        }

        Ok(())
    }
}
