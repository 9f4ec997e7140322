use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio::time::sleep_until;

use crate::clock::Clock;
use crate::clock::Timer;
use crate::clock::TimerHandle;

/// Timer backed by the tokio runtime.
///
/// Each scheduled task is a spawned tokio task that sleeps for the delay and then runs.
/// Time follows `tokio::time`, so a paused test runtime controls it too.
///
/// Tasks are spawned on the runtime captured at construction, so a timer built inside a
/// runtime can be scheduled from any thread.
///
/// # Panics
///
/// A timer built outside of a runtime falls back to the runtime current when scheduling;
/// [`Timer::schedule`] panics if there is none.
#[derive(Clone, Debug)]
pub struct TokioTimer {
    anchor: Instant,
    runtime: Option<Handle>,
}

/// Aborts the spawned task on cancel.
#[derive(Debug)]
pub struct TokioTimerHandle(AbortHandle);

impl TokioTimer {
    /// Captures the current runtime, if there is one.
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawns on `runtime` regardless of where the timer is used.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            anchor: Instant::now(),
            runtime: Some(runtime),
        }
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioTimer {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.anchor)
    }
}

impl Timer for TokioTimer {
    type Handle = TokioTimerHandle;

    fn schedule<F>(&self, delay: Duration, task: F) -> Self::Handle
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let fut = async move {
            sleep_until(deadline).await;
            task();
        };
        let join = match &self.runtime {
            Some(runtime) => runtime.spawn(fut),
            None => tokio::spawn(fut),
        };
        TokioTimerHandle(join.abort_handle())
    }
}

impl TimerHandle for TokioTimerHandle {
    fn cancel(&self) {
        self.0.abort();
    }
}
