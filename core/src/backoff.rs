//! Exponential backoff for transient RPC retries.
//!
//! Used only for confirming an already-submitted transaction within a single
//! swap step; never for retrying a failed swap step itself, which the
//! Coordinator always reports as a terminal failure.

use std::cmp::min;
use std::time::Duration;

use crate::const_assert;

const INITIAL_WAIT_MS: u64 = 250;
const MAXIMUM_WAIT_MS: u64 = 32_000;
const EXP_BASE: u64 = 2;

const_assert!(INITIAL_WAIT_MS != 0);

/// Returns an iterator of [`Duration`]s suitable for e.g. `tokio::time::sleep`
/// to observe exponential backoff, capped at [`MAXIMUM_WAIT_MS`].
pub fn get_backoff_iter() -> impl Iterator<Item = Duration> {
    (0u32..).map(|index| {
        let factor = EXP_BASE.saturating_pow(index);
        let wait_ms = INITIAL_WAIT_MS.saturating_mul(factor);
        let bounded_wait_ms = min(wait_ms, MAXIMUM_WAIT_MS);
        Duration::from_millis(bounded_wait_ms)
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_integer_overflow() {
        let mut backoff_durations = get_backoff_iter();
        for _ in 0..200 {
            backoff_durations.next();
        }
    }

    #[test]
    fn caps_at_maximum() {
        let mut backoff_durations = get_backoff_iter();
        let last = backoff_durations.nth(100).unwrap();
        assert_eq!(last, Duration::from_millis(MAXIMUM_WAIT_MS));
    }
}
