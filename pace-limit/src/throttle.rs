use std::fmt;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::time::Duration;

use tracing::trace;

use crate::DEFAULT_DELAY;
use crate::Reason;
use crate::clock::Clock;
use crate::clock::MonotonicClock;
use crate::cooldown::Cooldown;
use crate::error::InvalidTimeError;

/// Passes a call through immediately, then drops every call until `delay` has elapsed.
///
/// Dropped calls are not queued or deferred; their arguments are simply discarded.
pub struct Throttler<T, F, C = MonotonicClock> {
    callback: F,
    cooldown: Cooldown<C>,
    _args: PhantomData<fn(T)>,
}

impl<T, F> Throttler<T, F>
where
    F: Fn(T),
{
    /// Creates a throttler around `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeError`] if `delay` is zero.
    pub fn new(callback: F, delay: Duration) -> Result<Self, InvalidTimeError> {
        Self::with_clock(callback, delay, MonotonicClock::new())
    }

    /// Creates a throttler with a cooldown of [`DEFAULT_DELAY`].
    pub fn with_default_delay(callback: F) -> Self {
        Self {
            callback,
            cooldown: Cooldown::unchecked(DEFAULT_DELAY, MonotonicClock::new()),
            _args: PhantomData,
        }
    }
}

impl<T, F, C> Throttler<T, F, C>
where
    F: Fn(T),
    C: Clock,
{
    /// Creates a throttler that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeError`] if `delay` is zero.
    pub fn with_clock(callback: F, delay: Duration, clock: C) -> Result<Self, InvalidTimeError> {
        Ok(Self {
            callback,
            cooldown: Cooldown::with_clock(delay, clock)?,
            _args: PhantomData,
        })
    }

    /// Runs the callback with `args` unless the cooldown is still open.
    ///
    /// The callback runs synchronously on the calling thread, and a panic inside it propagates
    /// to the caller. The returned flow tells whether the call got through.
    pub fn exec(&self, args: T) -> ControlFlow<Reason> {
        match self.cooldown.try_acquire() {
            ControlFlow::Continue(()) => {
                (self.callback)(args);
                ControlFlow::Continue(())
            }
            ControlFlow::Break(reason) => {
                trace!(?reason, "throttled call dropped");
                ControlFlow::Break(reason)
            }
        }
    }

    /// Lets the next call through regardless of when the last one ran.
    pub fn reset(&self) {
        self.cooldown.reset();
    }

    /// The cooldown window.
    pub fn delay(&self) -> Duration {
        self.cooldown.delay()
    }
}

impl<T, F, C> fmt::Debug for Throttler<T, F, C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttler")
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    const SHORT_TIME: Duration = Duration::from_millis(1);

    type Calls = Arc<Mutex<Vec<i32>>>;

    fn recording() -> (Calls, impl Fn(i32) + Send + Sync + 'static) {
        let calls = Calls::default();
        let c = calls.clone();
        (calls, move |n| c.lock().push(n))
    }

    fn mocked<F: Fn(i32)>(callback: F) -> (Throttler<i32, F>, Arc<quanta::Mock>) {
        let (clock, mock) = quanta::Clock::mock();
        let throttler =
            Throttler::with_clock(callback, SHORT_TIME, MonotonicClock::from_quanta(clock))
                .unwrap();
        (throttler, mock)
    }

    #[test]
    fn test_zero_delay_is_rejected() {
        let err = Throttler::new(|_: i32| {}, Duration::ZERO).unwrap_err();
        assert_eq!(err, InvalidTimeError);
    }

    #[test]
    fn test_default_delay() {
        let throttler = Throttler::with_default_delay(|_: i32| {});
        assert_eq!(throttler.delay(), DEFAULT_DELAY);
    }

    #[test]
    fn test_back_to_back_calls_only_run_the_first() {
        let (calls, callback) = recording();
        let (throttler, _mock) = mocked(callback);

        assert!(throttler.exec(1).is_continue());
        assert!(throttler.exec(2).is_break());

        assert_eq!(*calls.lock(), vec![1]);
    }

    #[test]
    fn test_call_after_delay_runs() {
        let (calls, callback) = recording();
        let (throttler, mock) = mocked(callback);

        let _ = throttler.exec(1);
        mock.increment(SHORT_TIME);
        let _ = throttler.exec(2);

        assert_eq!(*calls.lock(), vec![1, 2]);
    }

    #[test]
    fn test_reset_allows_immediate_call() {
        let (calls, callback) = recording();
        let (throttler, _mock) = mocked(callback);

        let _ = throttler.exec(1);
        throttler.reset();
        let _ = throttler.exec(2);

        assert_eq!(*calls.lock(), vec![1, 2]);
    }

    #[test]
    fn test_dropped_call_reports_remaining_cooldown() {
        let (clock, mock) = quanta::Clock::mock();
        let throttler = Throttler::with_clock(
            |_: i32| {},
            Duration::from_millis(100),
            MonotonicClock::from_quanta(clock),
        )
        .unwrap();

        let _ = throttler.exec(1);
        mock.increment(Duration::from_millis(30));
        assert_eq!(
            throttler.exec(2),
            ControlFlow::Break(Reason::Cooling {
                retry_after: Duration::from_millis(70)
            })
        );
    }

    #[test]
    fn test_one_call_per_window() {
        let (calls, callback) = recording();
        let (clock, mock) = quanta::Clock::mock();
        let throttler = Throttler::with_clock(
            callback,
            Duration::from_millis(10),
            MonotonicClock::from_quanta(clock),
        )
        .unwrap();

        // A call every 3ms for 30ms: passes at 0, 12, 24.
        for n in 0..10 {
            let _ = throttler.exec(n);
            mock.increment(Duration::from_millis(3));
        }

        assert_eq!(*calls.lock(), vec![0, 4, 8]);
    }

    #[test]
    fn test_with_real_clock() {
        let (calls, callback) = recording();
        let throttler = Throttler::new(callback, Duration::from_millis(10)).unwrap();

        let _ = throttler.exec(1);
        let _ = throttler.exec(2);
        std::thread::sleep(Duration::from_millis(15));
        let _ = throttler.exec(3);

        assert_eq!(*calls.lock(), vec![1, 3]);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_callback_panic_propagates() {
        let throttler = Throttler::new(|_: ()| panic!("boom"), SHORT_TIME).unwrap();
        let _ = throttler.exec(());
    }

    #[test]
    fn test_shared_across_threads() {
        let (calls, callback) = recording();
        let throttler = Arc::new(Throttler::new(callback, Duration::from_secs(60)).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let t = Arc::clone(&throttler);
                std::thread::spawn(move || {
                    let _ = t.exec(n);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(calls.lock().len(), 1);
    }
}
