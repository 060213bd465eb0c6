//! Bounded busy-wait helpers
//!
//! Every hardware wait on the tag goes through these so that a stuck
//! peripheral costs a known number of polls instead of the battery.

/// A bounded wait ran out of attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollTimeout;

/// A bounded fallible wait either ran out of attempts or the probe failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollError<E> {
    Timeout,
    Io(E),
}

impl<E> From<PollTimeout> for PollError<E> {
    fn from(_: PollTimeout) -> Self {
        PollError::Timeout
    }
}

/// Call `done` up to `max_attempts` times until it returns `true`
///
/// Returns the number of attempts used. `max_attempts == 0` times out
/// without probing.
pub fn poll_until<F>(max_attempts: u32, mut done: F) -> Result<u32, PollTimeout>
where
    F: FnMut() -> bool,
{
    for attempt in 1..=max_attempts {
        if done() {
            return Ok(attempt);
        }
    }
    Err(PollTimeout)
}

/// Like [`poll_until`], but the probe itself can fail
///
/// A probe error ends the wait immediately.
pub fn try_poll_until<F, E>(max_attempts: u32, mut done: F) -> Result<u32, PollError<E>>
where
    F: FnMut() -> Result<bool, E>,
{
    for attempt in 1..=max_attempts {
        if done().map_err(PollError::Io)? {
            return Ok(attempt);
        }
    }
    Err(PollError::Timeout)
}
