use crate::{AsyncState, AsyncStatus, ExecutionResult, InitialState, RunError};
use futures_signals::signal::{Mutable, MutableSignalCloned, SignalExt, SignalStream};
use pin_project::pin_project;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, trace};

/// Bounds shared by every value an operation stores: the data it resolves
/// with and the error it rejects with.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + Send + Sync + 'static {}

/// A boxed tracked future, as produced by retry callbacks.
pub type BoxedRun<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

type RetryFn<T, E> = Arc<dyn Fn() -> BoxedRun<T, E> + Send + Sync>;

/// Per-instance behaviour of an [`AsyncOperation`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct OperationConfig {
    /// Re-raise rejections to the awaiting caller in addition to
    /// recording them in the state.
    pub throw_on_error: bool,
}

impl OperationConfig {
    pub fn throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }
}

/// Per-run options.
pub struct RunConfig<T, E> {
    retry: Option<RetryFn<T, E>>,
}

impl<T, E> RunConfig<T, E> {
    pub fn new() -> Self {
        RunConfig { retry: None }
    }

    /// Remember how to start this operation again, for [`AsyncOperation::retry`].
    pub fn retry<F, Fut>(mut self, retry: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.retry = Some(Arc::new(move || Box::pin(retry()) as BoxedRun<T, E>));
        self
    }

    pub fn has_retry(&self) -> bool {
        self.retry.is_some()
    }
}

impl<T, E> Default for RunConfig<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for RunConfig<T, E> {
    fn clone(&self) -> Self {
        RunConfig {
            retry: self.retry.clone(),
        }
    }
}

impl<T, E> fmt::Debug for RunConfig<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("retry", &self.retry.is_some())
            .finish()
    }
}

/// How a tracked future settled, as seen by the caller awaiting [`Running`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Settled<T, E> {
    Resolved(T),
    /// The future failed and the failure was only recorded in the state.
    Absorbed(E),
}

impl<T, E> Settled<T, E> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Settled::Resolved(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settled::Resolved(value) => Ok(value),
            Settled::Absorbed(error) => Err(error),
        }
    }
}

/// Handle to a run in flight.
///
/// The tracked future keeps running whether or not this handle is awaited.
/// When it is awaited, the operation's state has already been updated by
/// the time it resolves.
#[pin_project]
#[derive(Debug)]
pub struct Running<T, E> {
    #[pin]
    handle: JoinHandle<Result<Settled<T, E>, RunError<E>>>,
}

impl<T, E> Running<T, E> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T, E> Future for Running<T, E> {
    type Output = Result<Settled<T, E>, RunError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(self.project().handle.poll(cx)) {
            Ok(outcome) => Poll::Ready(outcome),
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => Poll::Ready(Err(RunError::Aborted)),
        }
    }
}

/// Tracks the lifecycle of one logical async operation.
///
/// Every `run`, `set_data` and `set_error` takes a new generation; a run's
/// settlement is applied only while its generation is still the latest and
/// the operation has not been retired. Clones share the same state.
pub struct AsyncOperation<T, E> {
    state: Mutable<AsyncState<T, E>>,
    generation: Arc<AtomicU64>,
    retry: Mutable<Option<RetryFn<T, E>>>,
    retirement: CancellationToken,
    config: OperationConfig,
}

impl<T, E> Clone for AsyncOperation<T, E> {
    fn clone(&self) -> Self {
        AsyncOperation {
            state: self.state.clone(),
            generation: self.generation.clone(),
            retry: self.retry.clone(),
            retirement: self.retirement.clone(),
            config: self.config,
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for AsyncOperation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOperation")
            .field("state", &*self.state.lock_ref())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("retired", &self.retirement.is_cancelled())
            .field("config", &self.config)
            .finish()
    }
}

impl<T: Payload, E: Payload> Default for AsyncOperation<T, E> {
    fn default() -> Self {
        Self::new(InitialState::default(), OperationConfig::default())
    }
}

impl<T: Payload, E: Payload> AsyncOperation<T, E> {
    pub fn new(initial: InitialState<T, E>, config: OperationConfig) -> Self {
        Self::with_retirement(initial, config, CancellationToken::new())
    }

    pub(crate) fn with_retirement(
        initial: InitialState<T, E>,
        config: OperationConfig,
        retirement: CancellationToken,
    ) -> Self {
        AsyncOperation {
            state: Mutable::new(initial.into_state()),
            generation: Arc::new(AtomicU64::new(0)),
            retry: Mutable::new(None),
            retirement,
            config,
        }
    }

    pub fn config(&self) -> OperationConfig {
        self.config
    }

    pub fn state(&self) -> AsyncState<T, E> {
        self.state.get_cloned()
    }

    pub fn status(&self) -> AsyncStatus {
        self.state.lock_ref().status
    }

    pub fn to_signal(&self) -> MutableSignalCloned<AsyncState<T, E>> {
        self.state.signal_cloned()
    }

    pub fn to_stream(&self) -> SignalStream<MutableSignalCloned<AsyncState<T, E>>> {
        self.state.signal_cloned().to_stream()
    }

    pub fn is_retired(&self) -> bool {
        self.retirement.is_cancelled()
    }

    /// Resolves once the operation has been retired.
    pub fn retired(&self) -> WaitForCancellationFuture<'_> {
        self.retirement.cancelled()
    }

    /// Whether a retry callback is currently captured.
    pub fn can_retry(&self) -> bool {
        self.retry.lock_ref().is_some()
    }

    /// Force a successful terminal state. Forgets any captured retry.
    pub fn set_data(&self, data: T) {
        {
            let mut state = self.state.lock_mut();
            if self.retirement.is_cancelled() {
                trace!("set_data ignored on retired operation");
                return;
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.succeed(data);
        }
        self.retry.set(None);
    }

    /// Force a failed terminal state.
    pub fn set_error(&self, error: E) {
        let mut state = self.state.lock_mut();
        if self.retirement.is_cancelled() {
            trace!("set_error ignored on retired operation");
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.fail(error);
    }

    /// Track `future` with default per-run options.
    pub fn run<F, R>(&self, future: F) -> Running<T, E>
    where
        F: Future<Output = R> + Send + 'static,
        R: ExecutionResult<T, E> + Send + 'static,
    {
        self.run_with(future, RunConfig::new())
    }

    /// Switch to `Loading` and start tracking `future` on the tokio runtime.
    ///
    /// Must be called from within a runtime context.
    pub fn run_with<F, R>(&self, future: F, config: RunConfig<T, E>) -> Running<T, E>
    where
        F: Future<Output = R> + Send + 'static,
        R: ExecutionResult<T, E> + Send + 'static,
    {
        if let Some(retry) = config.retry {
            self.retry.set(Some(retry));
        }
        let generation = self.begin_run();

        let state = self.state.clone();
        let current = self.generation.clone();
        let retirement = self.retirement.clone();
        let throw_on_error = self.config.throw_on_error;
        let handle = tokio::spawn(async move {
            let result = future.await.into_result();
            apply_settlement(&state, &current, &retirement, generation, &result);
            match result {
                Ok(data) => Ok(Settled::Resolved(data)),
                Err(error) if throw_on_error => Err(RunError::Rejected(error)),
                Err(error) => Ok(Settled::Absorbed(error)),
            }
        });
        Running { handle }
    }

    /// Start the captured retry callback again through [`run_with`](Self::run_with).
    /// Returns `None` when nothing was captured.
    ///
    /// On a retired operation the callback still runs and its handle still
    /// reports the outcome; only the state stays untouched.
    pub fn retry(&self) -> Option<Running<T, E>> {
        let retry = self.retry.get_cloned()?;
        if self.retirement.is_cancelled() {
            trace!("retry on retired operation: work runs, state is not updated");
        } else {
            debug!("retrying operation");
        }
        let future = retry();
        Some(self.run_with(future, RunConfig { retry: Some(retry) }))
    }

    /// Stop every pending and future settlement from touching the state.
    pub fn retire(&self) {
        let _state = self.state.lock_ref();
        if !self.retirement.is_cancelled() {
            debug!("operation retired");
        }
        self.retirement.cancel();
    }

    fn begin_run(&self) -> u64 {
        let mut state = self.state.lock_mut();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.retirement.is_cancelled() {
            trace!(generation, "run started on retired operation");
        } else {
            debug!(generation, "run started");
            state.begin_loading();
        }
        generation
    }
}

fn apply_settlement<T: Payload, E: Payload>(
    state: &Mutable<AsyncState<T, E>>,
    current: &AtomicU64,
    retirement: &CancellationToken,
    generation: u64,
    result: &Result<T, E>,
) {
    let mut state = state.lock_mut();
    if retirement.is_cancelled() {
        trace!(generation, "settlement dropped: operation retired");
        return;
    }
    if current.load(Ordering::SeqCst) != generation {
        trace!(generation, "settlement dropped: superseded by a newer run");
        return;
    }
    match result {
        Ok(data) => state.succeed(data.clone()),
        Err(error) => state.fail(error.clone()),
    }
}
