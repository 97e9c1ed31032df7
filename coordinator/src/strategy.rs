//! `StrategyProfile`: the single Coordinator state machine parameterized
//! over split/withdraw/hop/obfuscation behavior, per `spec.md` §9
//! "Polymorphism over privacy strategy" (a REDESIGN FLAG against the
//! source's two parallel "privacy services").

use relayer_core::constants::{HOP_COUNT_RANGE, OBFUSCATION_RANGE_LAMPORTS};
use relayer_core::rng::Crng;

use crate::split_plan::build_split_plan;

/// How a profile splits a deposit into notes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitStrategy {
    /// `spec.md` §4.4 "Split plan": banded note count, randomized ratios.
    Standard,
    /// Never splits; the whole deposit is one note. Used only by
    /// [`StrategyProfile::direct`] to exercise the merge/hop stages without
    /// the withdraw sub-state in isolation.
    SingleNote,
}

#[derive(Clone, Copy, Debug)]
pub struct StrategyProfile {
    pub name: &'static str,
    pub split: SplitStrategy,
    /// Whether notes pass through a separate withdraw wallet (`D_i -> W_i`)
    /// before merge/hop, or go straight from deposit to merge/hop.
    pub withdraw_enabled: bool,
    pub hop_range: (u32, u32),
    pub obfuscation_range_lamports: u64,
}

impl StrategyProfile {
    /// The only profile the Control Surface ever drives (`spec.md` §4.4 in
    /// full): split, deposit, mixing window dwell, withdraw with
    /// obfuscation, merge, 1-2 hops, finalize.
    pub const fn standard() -> Self {
        Self {
            name: "standard",
            split: SplitStrategy::Standard,
            withdraw_enabled: true,
            hop_range: HOP_COUNT_RANGE,
            obfuscation_range_lamports: OBFUSCATION_RANGE_LAMPORTS,
        }
    }

    /// Test-only profile that skips the withdraw sub-state so coordinator
    /// tests can exercise merge/hop/finalize in isolation. Never constructed
    /// outside `#[cfg(test)]` code and never reachable from
    /// `relayer-api` (`spec.md` §9: "do not re-architect as two parallel
    /// components").
    pub const fn direct() -> Self {
        Self {
            name: "direct",
            split: SplitStrategy::SingleNote,
            withdraw_enabled: false,
            hop_range: HOP_COUNT_RANGE,
            obfuscation_range_lamports: OBFUSCATION_RANGE_LAMPORTS,
        }
    }

    pub fn build_split_plan(&self, amount_lamports: u64, rng: &mut impl Crng) -> Vec<u64> {
        match self.split {
            SplitStrategy::Standard => build_split_plan(amount_lamports, rng),
            SplitStrategy::SingleNote => vec![amount_lamports],
        }
    }
}
