//! Timestamp type and an injectable [`Clock`] abstraction.
//!
//! The Coordinator and Ledger depend on `Clock` rather than calling
//! `SystemTime::now()` directly so tests can drive time deterministically
//! (`spec.md` §8: "clock is injected").

use std::convert::TryFrom;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use serde::{de, Deserialize, Deserializer, Serialize};

/// The number of milliseconds since the [`UNIX_EPOCH`].
///
/// Internally a non-negative [`i64`]; any timestamp before 1970 or beyond
/// ~292 million years past epoch is rejected at construction time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimestampMillis(i64);

impl TimestampMillis {
    pub fn now() -> Self {
        Self::try_from(SystemTime::now()).expect("system clock is sane")
    }

    /// Constructs a [`TimestampMillis`] from a raw millisecond count, e.g.
    /// one read back from a `TIMESTAMPTZ` database column.
    pub fn from_millis(ms: i64) -> Self {
        assert!(ms >= 0, "TimestampMillis must be non-negative");
        Self(ms)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        let delta_ms = i64::try_from(duration.as_millis()).ok()?;
        self.0.checked_add(delta_ms).map(Self)
    }

    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        let delta_ms = self.0.saturating_sub(earlier.0).max(0);
        Duration::from_millis(delta_ms as u64)
    }
}

impl From<TimestampMillis> for SystemTime {
    fn from(timestamp: TimestampMillis) -> Self {
        let timestamp_u64 = u64::try_from(timestamp.0)
            .expect("Non-negative invariant was violated");
        UNIX_EPOCH + Duration::from_millis(timestamp_u64)
    }
}

impl TryFrom<SystemTime> for TimestampMillis {
    type Error = anyhow::Error;
    fn try_from(system_time: SystemTime) -> anyhow::Result<Self> {
        system_time
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_millis())
            .map(i64::try_from)
            .map(|res| res.map(Self))
            .context("Current time is before January 1st, 1970")?
            .context("Current time is more than 292 million years past epoch")
    }
}

impl<'de> Deserialize<'de> for TimestampMillis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        if value >= 0 {
            Ok(TimestampMillis(value))
        } else {
            Err(de::Error::invalid_value(
                de::Unexpected::Signed(value),
                &"Unix timestamp must be non-negative",
            ))
        }
    }
}

/// An injectable source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimestampMillis;
}

/// The production [`Clock`], backed by the OS wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampMillis {
        TimestampMillis::now()
    }
}

/// Not `cfg(test)`-gated: downstream crates (vault, ledger, monitor,
/// coordinator) need [`FakeClock`] in their own `#[cfg(test)]` modules, and
/// `cfg(test)` is per-crate, not transitive across a dependency edge.
pub mod test_utils {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    /// A [`Clock`] whose value is set explicitly, for deterministic tests of
    /// timeout-based behavior (mixing delay jitter, recovery timeout).
    pub struct FakeClock {
        now_ms: AtomicI64,
    }

    impl FakeClock {
        pub fn new(now: TimestampMillis) -> Self {
            Self {
                now_ms: AtomicI64::new(now.as_i64()),
            }
        }

        pub fn advance(&self, duration: std::time::Duration) {
            self.now_ms
                .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> TimestampMillis {
            TimestampMillis(self.now_ms.load(Ordering::SeqCst))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_enforces_nonnegative() {
        assert_eq!(
            serde_json::from_str::<TimestampMillis>("42").unwrap().as_i64(),
            42
        );
        assert!(serde_json::from_str::<TimestampMillis>("-42").is_err());
    }

    #[test]
    fn checked_add_roundtrips_through_systemtime() {
        let t = TimestampMillis::now();
        let later = t.checked_add(Duration::from_secs(60)).unwrap();
        assert_eq!(
            later.saturating_duration_since(t),
            Duration::from_secs(60)
        );
    }
}
