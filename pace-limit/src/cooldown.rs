use std::ops::ControlFlow;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tracing::debug;

use crate::Reason;
use crate::clock::Clock;
use crate::clock::MonotonicClock;
use crate::error::InvalidTimeError;
use crate::error::validate;

/// Any reading of a clock is at or after its origin, so this always lets the next call through.
const ALWAYS_ALLOWED: u64 = 0;

/// The gate behind a throttle.
///
/// Lets one caller through, then rejects everyone until `delay` has passed since that caller
/// got in. State is a single atomic timestamp updated with compare-and-swap, so the gate can be
/// shared across threads via `Arc` without two callers slipping through the same window.
#[derive(Debug)]
pub struct Cooldown<C = MonotonicClock> {
    /// Earliest instant, in nanoseconds on `clock`, at which the next caller is let through.
    next_allowed: AtomicU64,
    delay_ns: u64,
    clock: C,
}

impl Cooldown<MonotonicClock> {
    /// Creates a cooldown on a [`MonotonicClock`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeError`] if `delay` is zero.
    pub fn new(delay: Duration) -> Result<Self, InvalidTimeError> {
        Self::with_clock(delay, MonotonicClock::new())
    }
}

impl<C: Clock> Cooldown<C> {
    /// Creates a cooldown that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimeError`] if `delay` is zero.
    pub fn with_clock(delay: Duration, clock: C) -> Result<Self, InvalidTimeError> {
        let delay = validate(delay)?;
        Ok(Self::unchecked(delay, clock))
    }

    /// `delay` must be non-zero.
    pub(crate) fn unchecked(delay: Duration, clock: C) -> Self {
        debug!(?delay, "cooldown created");
        let cooldown = Self {
            next_allowed: AtomicU64::new(ALWAYS_ALLOWED),
            delay_ns: as_nanos(delay),
            clock,
        };
        cooldown.reset();
        cooldown
    }

    /// Claims the current window.
    ///
    /// Returns `Continue` if the caller got through, in which case the window is now closed
    /// for `delay`. Otherwise returns how long until it reopens.
    #[inline]
    pub fn try_acquire(&self) -> ControlFlow<Reason> {
        let now = as_nanos(self.clock.now());

        loop {
            let next_allowed = self.next_allowed.load(Ordering::Acquire);

            if now < next_allowed {
                return ControlFlow::Break(Reason::Cooling {
                    retry_after: Duration::from_nanos(next_allowed - now),
                });
            }

            if self
                .next_allowed
                .compare_exchange_weak(
                    next_allowed,
                    now.saturating_add(self.delay_ns),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return ControlFlow::Continue(());
            }
        }
    }

    /// Reopens the window immediately, however recently the last caller got through.
    pub fn reset(&self) {
        self.next_allowed.store(ALWAYS_ALLOWED, Ordering::Release);
    }

    /// How long the window stays closed after a caller gets through.
    pub fn delay(&self) -> Duration {
        Duration::from_nanos(self.delay_ns)
    }
}

fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
