//! # pace-limit
//!
//! `pace-limit` wraps a callback so that a burst of invocation requests is either collapsed
//! (debounce) or thinned out (throttle).
//!
//! ## Key Concepts
//!
//! * **Debouncer**: every `exec` supersedes the previously pending one. Only the latest
//!   arguments are delivered, `delay` after the burst goes quiet.
//! * **Throttler**: the first `exec` passes straight through, then every call is dropped
//!   until the cooldown has elapsed.
//! * **Injected time**: clocks and timers are capabilities. [`TokioTimer`] and
//!   [`MonotonicClock`] are the production defaults, [`ManualTimer`] drives simulated time.
//!
//! ## Example
//!
//! ```rust
//! use pace_limit::Throttler;
//! use std::time::Duration;
//!
//! let throttler = Throttler::new(|n: u32| println!("got {n}"), Duration::from_millis(100))
//!     .unwrap();
//!
//! assert!(throttler.exec(1).is_continue());
//! assert!(throttler.exec(2).is_break());
//! ```

use std::time::Duration;

mod clock;
mod cooldown;
mod debounce;
mod error;
mod manual_timer;
mod throttle;
mod tokio_timer;

pub use clock::Clock;
pub use clock::MonotonicClock;
pub use clock::Timer;
pub use clock::TimerHandle;
pub use cooldown::Cooldown;
pub use debounce::Debouncer;
pub use error::InvalidTimeError;
pub use manual_timer::ManualTimer;
pub use manual_timer::ManualTimerHandle;
pub use throttle::Throttler;
pub use tokio_timer::TokioTimer;
pub use tokio_timer::TokioTimerHandle;

/// Delay used by the `with_default_delay` constructors.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Reasons why a call might be held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The cooldown window is still open.
    Cooling { retry_after: Duration },
}
