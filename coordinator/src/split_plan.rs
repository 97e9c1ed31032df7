//! Split-plan construction (`spec.md` §4.4 "Split plan").
//!
//! Works entirely in integer lamports: the spec's "round each to 9 decimals"
//! is automatically satisfied since one lamport *is* 1e-9 SOL, and sampling
//! the split ratio as an integer per-mille (rather than an `f64` fraction)
//! keeps the running sum exact for amounts well beyond `f64`'s 53-bit
//! mantissa.

use relayer_core::constants::{MAX_NOTES, MIN_NOTES, MIN_SPLIT_LAMPORTS};
use relayer_core::rng::{Crng, RngExt};

const SOL: u64 = 1_000_000_000;

/// Per-mille bounds of the fraction-of-remaining each non-final note takes:
/// `uniform(0.15, 0.35)` in the spec.
const RATIO_MIN_PER_MILLE: u64 = 150;
const RATIO_MAX_PER_MILLE: u64 = 350;

/// Chooses the note count `N` for `amount_lamports`, banded per
/// `spec.md` §4.4, clamped to `[MIN_NOTES, MAX_NOTES]`.
///
/// Returns `None` if `amount_lamports <= 2 * MIN_SPLIT_LAMPORTS`, in which
/// case the caller should skip splitting entirely and use a single note.
pub fn choose_note_count(amount_lamports: u64) -> Option<u32> {
    if amount_lamports <= 2 * MIN_SPLIT_LAMPORTS {
        return None;
    }
    let n = if amount_lamports > SOL {
        std::cmp::min(8, (amount_lamports / (SOL / 5)) as u32)
    } else if amount_lamports > SOL / 2 {
        6
    } else if amount_lamports > SOL / 10 {
        4
    } else {
        2
    };
    Some(n.clamp(MIN_NOTES, MAX_NOTES))
}

/// Splits `amount_lamports` into a shuffled list of per-note values summing
/// exactly to `amount_lamports`, each at least `MIN_SPLIT_LAMPORTS` (subject
/// to `amount_lamports` being large enough to support `MIN_NOTES` of them —
/// guaranteed by the caller having gone through [`choose_note_count`]).
pub fn build_split_plan(amount_lamports: u64, rng: &mut impl Crng) -> Vec<u64> {
    let Some(note_count) = choose_note_count(amount_lamports) else {
        return vec![amount_lamports];
    };

    let mut values = Vec::with_capacity(note_count as usize);
    let mut remaining = amount_lamports;

    for i in 0..note_count - 1 {
        let notes_left_after = note_count - i - 1;
        let reserve_for_rest = u64::from(notes_left_after) * MIN_SPLIT_LAMPORTS;
        let available = remaining.saturating_sub(reserve_for_rest);

        let per_mille =
            RATIO_MIN_PER_MILLE + rng.gen_range_u64(0, RATIO_MAX_PER_MILLE - RATIO_MIN_PER_MILLE + 1);
        let raw = (u128::from(remaining) * u128::from(per_mille) / 1_000) as u64;
        let value = raw.max(MIN_SPLIT_LAMPORTS).min(available.max(MIN_SPLIT_LAMPORTS));

        values.push(value);
        remaining -= value;
    }
    // The final note absorbs whatever remains, keeping the sum exact.
    values.push(remaining);

    shuffle(&mut values, rng);
    values
}

/// Fisher-Yates shuffle so ordering carries no positional signal
/// (`spec.md` §4.4: "Shuffle ... so ordering carries no signal").
fn shuffle<T>(values: &mut [T], rng: &mut impl Crng) {
    for i in (1..values.len()).rev() {
        let j = rng.gen_range_u64(0, i as u64 + 1) as usize;
        values.swap(i, j);
    }
}

#[cfg(test)]
mod test {
    use relayer_core::rng::SysRng;

    use super::*;

    #[test]
    fn small_amount_is_a_single_note() {
        assert_eq!(choose_note_count(2 * MIN_SPLIT_LAMPORTS), None);
        let plan = build_split_plan(2 * MIN_SPLIT_LAMPORTS, &mut SysRng::new());
        assert_eq!(plan, vec![2 * MIN_SPLIT_LAMPORTS]);
    }

    #[test]
    fn three_sol_produces_eight_notes() {
        assert_eq!(choose_note_count(3 * SOL), Some(8));
    }

    #[test]
    fn zero_point_zero_five_sol_between_two_and_six_notes() {
        let amount = SOL / 20; // 0.05 SOL
        let n = choose_note_count(amount).unwrap();
        assert!((2..=6).contains(&n));
    }

    #[test]
    fn min_swap_minus_one_lamport_is_below_min_split_band() {
        // Sanity check for the boundary just under the single-note cutoff.
        assert_eq!(choose_note_count(2 * MIN_SPLIT_LAMPORTS - 1), None);
    }

    #[test]
    fn sum_matches_amount_exactly_across_many_seeds() {
        let mut rng = SysRng::new();
        for amount in [
            2 * MIN_SPLIT_LAMPORTS + 1,
            SOL / 20,
            SOL / 2 + 1,
            SOL + 1,
            3 * SOL,
            10 * SOL,
        ] {
            for _ in 0..20 {
                let plan = build_split_plan(amount, &mut rng);
                assert_eq!(plan.iter().sum::<u64>(), amount);
                assert!(plan.len() as u32 >= MIN_NOTES || plan.len() == 1);
                assert!(plan.len() as u32 <= MAX_NOTES);
                if plan.len() > 1 {
                    for &v in &plan {
                        assert!(v >= MIN_SPLIT_LAMPORTS);
                    }
                }
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn split_plan_sums_to_amount(amount in (2 * MIN_SPLIT_LAMPORTS + 1)..50_000 * SOL) {
            let mut rng = SysRng::new();
            let plan = build_split_plan(amount, &mut rng);
            proptest::prop_assert_eq!(plan.iter().sum::<u64>(), amount);
            proptest::prop_assert!(plan.len() as u32 <= MAX_NOTES);
            for v in plan {
                proptest::prop_assert!(v >= MIN_SPLIT_LAMPORTS);
            }
        }
    }
}
