use std::fmt::Debug;
use std::time::Duration;

use quanta::Instant;

/// A monotonic source of "now".
///
/// Readings are offsets from an origin fixed when the clock was created, so two readings from
/// the same clock can be compared and subtracted.
pub trait Clock: Clone + Debug + Send + Sync + 'static {
    fn now(&self) -> Duration;
}

/// A scheduled task that can be withdrawn before it runs.
pub trait TimerHandle: Debug + Send + Sync + 'static {
    /// Prevents the task from running. Calling this after the task ran, or twice, does nothing.
    fn cancel(&self);
}

/// A clock that can also run a task once a delay has elapsed.
pub trait Timer: Clock {
    type Handle: TimerHandle;

    fn schedule<F>(&self, delay: Duration, task: F) -> Self::Handle
    where
        F: FnOnce() + Send + 'static;
}

/// TSC backed clock.
///
/// Wraps a [`quanta::Clock`], so tests can substitute `quanta::Clock::mock()` and move time
/// by hand.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    clock: quanta::Clock,
    /// A fixed point in time to calculate deltas from.
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::from_quanta(quanta::Clock::new())
    }

    pub fn from_quanta(clock: quanta::Clock) -> Self {
        let anchor = clock.now();
        Self { clock, anchor }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.clock.now().duration_since(self.anchor)
    }
}
