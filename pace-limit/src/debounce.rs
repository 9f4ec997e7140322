use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;

use crate::DEFAULT_DELAY;
use crate::clock::Timer;
use crate::clock::TimerHandle;
use crate::error::InvalidTimeError;
use crate::error::validate;
use crate::tokio_timer::TokioTimer;

/// Collapses a burst of calls into one deferred call carrying the latest arguments.
///
/// Every [`exec`](Debouncer::exec) withdraws whatever was pending and schedules a fresh call
/// `delay` from now. The callback therefore runs once the burst has been quiet for `delay`.
///
/// Dropping a `Debouncer` does not withdraw a pending call. Call [`cancel`](Debouncer::cancel)
/// first if the call must not happen.
pub struct Debouncer<T, F, M = TokioTimer>
where
    M: Timer,
{
    shared: Arc<Shared<T, F, M::Handle>>,
    delay: Duration,
    timer: M,
}

struct Shared<T, F, H> {
    callback: F,
    state: Mutex<State<T, H>>,
}

struct State<T, H> {
    /// Bumped on every `exec`; a firing timer only runs if it still owns the armed one.
    generation: u64,
    armed: Option<Armed<H>>,
    /// Arguments of the latest `exec`, kept until the call runs.
    ///
    /// `cancel` disarms the timer but leaves these in place, so a later `flush` still runs.
    prepared: Option<T>,
}

struct Armed<H> {
    generation: u64,
    handle: H,
}

impl<T, F> Debouncer<T, F, TokioTimer>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    /// Creates a debouncer that defers calls on the tokio runtime.
    ///
    /// The runtime is the one current at construction, if any; see [`TokioTimer::new`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeError`] if `delay` is zero.
    ///
    /// # Panics
    ///
    /// Constructing outside a runtime succeeds, but [`exec`](Debouncer::exec) then panics
    /// unless it is itself called from within a tokio runtime.
    pub fn new(callback: F, delay: Duration) -> Result<Self, InvalidTimeError> {
        Self::with_timer(callback, delay, TokioTimer::new())
    }

    /// Creates a debouncer with a quiet period of [`DEFAULT_DELAY`].
    ///
    /// # Panics
    ///
    /// As for [`Debouncer::new`].
    pub fn with_default_delay(callback: F) -> Self {
        Self::build(callback, DEFAULT_DELAY, TokioTimer::new())
    }
}

impl<T, F, M> Debouncer<T, F, M>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
    M: Timer,
{
    /// Creates a debouncer that defers calls on `timer`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeError`] if `delay` is zero.
    pub fn with_timer(callback: F, delay: Duration, timer: M) -> Result<Self, InvalidTimeError> {
        let delay = validate(delay)?;
        Ok(Self::build(callback, delay, timer))
    }

    fn build(callback: F, delay: Duration, timer: M) -> Self {
        debug!(?delay, "debouncer created");
        Self {
            shared: Arc::new(Shared {
                callback,
                state: Mutex::new(State {
                    generation: 0,
                    armed: None,
                    prepared: None,
                }),
            }),
            delay,
            timer,
        }
    }

    /// Schedules the callback with `args`, superseding any call still pending.
    ///
    /// A superseded call is discarded even if its timer is already due.
    ///
    /// # Panics
    ///
    /// Panics if the timer cannot schedule, which for [`TokioTimer`] means no tokio runtime
    /// was current either at construction or now.
    pub fn exec(&self, args: T) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        let generation = state.generation;

        let shared = Arc::clone(&self.shared);
        let handle = self
            .timer
            .schedule(self.delay, move || shared.fire(generation));

        state.prepared = Some(args);
        if let Some(superseded) = state.armed.replace(Armed { generation, handle }) {
            superseded.handle.cancel();
            trace!(generation = superseded.generation, "pending call superseded");
        }
    }

    /// Withdraws the pending timer, if any.
    ///
    /// The prepared arguments survive, so [`flush`](Debouncer::flush) can still run them.
    pub fn cancel(&self) {
        let armed = self.shared.state.lock().armed.take();
        if let Some(armed) = armed {
            armed.handle.cancel();
            trace!(generation = armed.generation, "pending call cancelled");
        }
    }

    /// Runs the prepared call now instead of waiting for its timer.
    ///
    /// The timer is withdrawn first, so the call cannot run a second time. Does nothing when
    /// nothing is prepared, including straight after a previous `flush` or a firing.
    pub fn flush(&self) {
        let (armed, prepared) = {
            let mut state = self.shared.state.lock();
            (state.armed.take(), state.prepared.take())
        };
        if let Some(armed) = armed {
            armed.handle.cancel();
        }
        if let Some(args) = prepared {
            trace!("prepared call flushed");
            (self.shared.callback)(args);
        }
    }

    /// Whether a timer is armed to run the prepared call.
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().armed.is_some()
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T, F, H> Shared<T, F, H>
where
    F: Fn(T),
{
    fn fire(&self, generation: u64) {
        let due = {
            let mut state = self.state.lock();
            let current = state
                .armed
                .as_ref()
                .is_some_and(|armed| armed.generation == generation);
            if current {
                state.armed = None;
                state.prepared.take()
            } else {
                None
            }
        };

        // Never call back into user code with the lock held; it may exec again.
        if let Some(args) = due {
            trace!(generation, "pending call fired");
            (self.callback)(args);
        }
    }
}

impl<T, F, M> fmt::Debug for Debouncer<T, F, M>
where
    M: Timer,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("timer", &self.timer)
            .field("generation", &state.generation)
            .field("armed", &state.armed.is_some())
            .field("prepared", &state.prepared.is_some())
            .finish_non_exhaustive()
    }
}
