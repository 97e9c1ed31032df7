//! Mixing-window bucketing (`spec.md` §4.4 "Mixing window assignment").

use relayer_core::clock::TimestampMillis;
use relayer_core::constants::MIXING_WINDOW;

/// The wall-clock bucket `now` falls into: `floor(now / W) * W`, rendered as
/// the decimal string used for `mixing_windows.window_id`.
pub struct WindowAssignment {
    pub window_id: String,
    pub start: TimestampMillis,
    pub end: TimestampMillis,
}

pub fn assign_window(now: TimestampMillis) -> WindowAssignment {
    let window_ms = MIXING_WINDOW.as_millis() as i64;
    let floor_ms = (now.as_i64() / window_ms) * window_ms;
    let start = TimestampMillis::from_millis(floor_ms);
    let end = start
        .checked_add(MIXING_WINDOW)
        .expect("mixing window end fits in TimestampMillis");
    WindowAssignment {
        window_id: floor_ms.to_string(),
        start,
        end,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buckets_to_window_width() {
        let window_ms = MIXING_WINDOW.as_millis() as i64;
        let now = TimestampMillis::from_millis(window_ms * 7 + 15_000);
        let assignment = assign_window(now);
        assert_eq!(assignment.window_id, (window_ms * 7).to_string());
        assert_eq!(assignment.start.as_i64(), window_ms * 7);
        assert_eq!(assignment.end.as_i64(), window_ms * 8);
    }

    #[test]
    fn same_bucket_for_two_timestamps_within_it() {
        let window_ms = MIXING_WINDOW.as_millis() as i64;
        let a = assign_window(TimestampMillis::from_millis(window_ms * 3 + 1));
        let b = assign_window(TimestampMillis::from_millis(window_ms * 3 + window_ms - 1));
        assert_eq!(a.window_id, b.window_id);
    }

    #[test]
    fn different_bucket_across_boundary() {
        let window_ms = MIXING_WINDOW.as_millis() as i64;
        let a = assign_window(TimestampMillis::from_millis(window_ms * 3 - 1));
        let b = assign_window(TimestampMillis::from_millis(window_ms * 3));
        assert_ne!(a.window_id, b.window_id);
    }
}
