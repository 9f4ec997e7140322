use std::time::Duration;

/// The delay handed to a debouncer, throttler or cooldown was zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("delay must be greater than zero")]
pub struct InvalidTimeError;

pub(crate) fn validate(delay: Duration) -> Result<Duration, InvalidTimeError> {
    if delay.is_zero() {
        Err(InvalidTimeError)
    } else {
        Ok(delay)
    }
}
