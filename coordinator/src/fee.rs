//! Deterministic relayer-fee computation (`spec.md` §3 invariant: "relayer
//! fee is computed deterministically from amount at initiate and stored; no
//! later code path recomputes from live constants").

use relayer_core::constants::RELAYER_FEE_BPS;

/// `RELAYER_FEE_BPS` basis points of `amount_lamports`, rounded down.
/// Called exactly once, at swap creation time; the Coordinator and the
/// recovery path both read the stored value back off the [`Swap`](
/// relayer_registry::Swap) row rather than calling this again.
pub fn compute_relayer_fee_lamports(amount_lamports: u64) -> u64 {
    (u128::from(amount_lamports) * u128::from(RELAYER_FEE_BPS) / 10_000) as u64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn five_bps_of_one_sol() {
        // 1 SOL * 5bps = 500_000 lamports.
        assert_eq!(compute_relayer_fee_lamports(1_000_000_000), 500_000);
    }

    #[test]
    fn fee_of_zero_is_zero() {
        assert_eq!(compute_relayer_fee_lamports(0), 0);
    }

    #[test]
    fn scales_linearly() {
        assert_eq!(
            compute_relayer_fee_lamports(2_000_000_000),
            2 * compute_relayer_fee_lamports(1_000_000_000)
        );
    }
}
