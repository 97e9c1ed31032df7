//! Randomized delay and obfuscation sampling (`spec.md` §4.4).
//!
//! Every value here is sampled from the injected [`Crng`], never derived
//! from swap inputs, to avoid a timing oracle (`spec.md` §4.4
//! "Randomness").

use std::time::Duration;

use relayer_core::constants::OBFUSCATION_RANGE_LAMPORTS;
use relayer_core::rng::{Crng, RngExt};

/// Floor applied after obfuscation jitter: `max(0.0001 SOL, v_i + jitter)`.
const MIN_OBFUSCATED_LAMPORTS: u64 = 100_000;

fn uniform_duration(rng: &mut impl Crng, low: Duration, high: Duration) -> Duration {
    let low_ms = low.as_millis() as u64;
    let high_ms = high.as_millis() as u64;
    if low_ms >= high_ms {
        return low;
    }
    Duration::from_millis(rng.gen_range_u64(low_ms, high_ms))
}

/// Between successive note deposits: `uniform(2s, 6s)`.
pub fn deposit_delay(rng: &mut impl Crng) -> Duration {
    uniform_duration(rng, Duration::from_secs(2), Duration::from_secs(6))
}

/// Base mixing delay after all notes have deposited: `base = 10s +
/// min(tx_count*2s, 30s) + uniform(0, 10s)`.
pub fn mixing_delay_base(rng: &mut impl Crng, tx_count: u32) -> Duration {
    let scaled = Duration::from_secs(u64::from(tx_count) * 2).min(Duration::from_secs(30));
    Duration::from_secs(10) + scaled + uniform_duration(rng, Duration::ZERO, Duration::from_secs(10))
}

/// The doubling re-sleep specified by `spec.md` §4.4 / §9: an *additional*
/// `uniform(mixing_delay, mixing_delay + 10s)` sleep after `mixing_delay`
/// has already elapsed. Kept intentional, not collapsed into one sleep —
/// see `DESIGN.md`.
pub fn mixing_delay_extra(rng: &mut impl Crng, mixing_delay: Duration) -> Duration {
    uniform_duration(rng, mixing_delay, mixing_delay + Duration::from_secs(10))
}

/// Before transferring `D_i -> W_i`: `uniform(5s, 15s)`.
pub fn withdraw_delay(rng: &mut impl Crng) -> Duration {
    uniform_duration(rng, Duration::from_secs(5), Duration::from_secs(15))
}

/// Between successive merge hops: `uniform(3s, 8s)`.
pub fn merge_delay(rng: &mut impl Crng) -> Duration {
    uniform_duration(rng, Duration::from_secs(3), Duration::from_secs(8))
}

/// Before each post-merge hop: `uniform(5s, 12s)`.
pub fn hop_delay(rng: &mut impl Crng) -> Duration {
    uniform_duration(rng, Duration::from_secs(5), Duration::from_secs(12))
}

/// Before finalizing: `uniform(8s, 20s)`.
pub fn finalize_delay(rng: &mut impl Crng) -> Duration {
    uniform_duration(rng, Duration::from_secs(8), Duration::from_secs(20))
}

/// `H in {1, 2}` uniformly (`spec.md` §4.4 step 7).
pub fn sample_hop_count(rng: &mut impl Crng, range: (u32, u32)) -> u32 {
    let (low, high) = range;
    low + rng.gen_range_u64(0, u64::from(high - low) + 1) as u32
}

/// Additive uniform jitter in `[-R, +R]` applied to a note's amount before
/// withdrawal, floored at `MIN_OBFUSCATED_LAMPORTS`
/// (`spec.md` §4.4 step 5: `v_i' = max(0.0001, v_i + uniform(-R, R))`).
/// `range_lamports` is the `StrategyProfile`'s configured `R`; production
/// callers pass [`OBFUSCATION_RANGE_LAMPORTS`].
pub fn obfuscate_amount_with_range(
    rng: &mut impl Crng,
    value_lamports: u64,
    range_lamports: u64,
) -> u64 {
    let span = 2 * range_lamports + 1;
    let jitter = rng.gen_range_u64(0, span) as i64 - range_lamports as i64;
    let jittered = value_lamports as i64 + jitter;
    jittered.max(MIN_OBFUSCATED_LAMPORTS as i64) as u64
}

#[cfg(test)]
mod test {
    use relayer_core::rng::SysRng;

    use super::*;

    #[test]
    fn deposit_delay_in_bounds() {
        let mut rng = SysRng::new();
        for _ in 0..200 {
            let d = deposit_delay(&mut rng);
            assert!(d >= Duration::from_secs(2) && d < Duration::from_secs(6));
        }
    }

    #[test]
    fn hop_count_is_one_or_two() {
        let mut rng = SysRng::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let h = sample_hop_count(&mut rng, (1, 2));
            assert!(h == 1 || h == 2);
            seen.insert(h);
        }
        assert_eq!(seen, [1, 2].into_iter().collect());
    }

    #[test]
    fn obfuscation_respects_floor_and_range() {
        let mut rng = SysRng::new();
        for _ in 0..500 {
            let jittered =
                obfuscate_amount_with_range(&mut rng, 1_000_000, OBFUSCATION_RANGE_LAMPORTS);
            assert!(jittered >= MIN_OBFUSCATED_LAMPORTS);
            let delta = (jittered as i64 - 1_000_000i64).abs() as u64;
            assert!(delta <= OBFUSCATION_RANGE_LAMPORTS);
        }
    }

    #[test]
    fn obfuscation_floors_tiny_amounts() {
        let mut rng = SysRng::new();
        let jittered = obfuscate_amount_with_range(&mut rng, 1, OBFUSCATION_RANGE_LAMPORTS);
        assert!(jittered >= MIN_OBFUSCATED_LAMPORTS);
    }

    #[test]
    fn mixing_delay_base_grows_with_tx_count_then_caps() {
        let mut rng = SysRng::new();
        let low = mixing_delay_base(&mut rng, 0);
        let high = mixing_delay_base(&mut rng, 100);
        assert!(low >= Duration::from_secs(10) && low < Duration::from_secs(20));
        assert!(high >= Duration::from_secs(40) && high < Duration::from_secs(50));
    }
}
