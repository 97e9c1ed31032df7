//! Immutable protocol constants (`spec.md` §6 "Immutable constants").
//!
//! These values are part of the protocol, not runtime configuration: they
//! are compiled in and hashed (see [`crate::config_hash`]) so that a swap's
//! persisted `config_hash` can later prove which protocol parameters were in
//! effect when it ran. None of them may change without a redeploy.

use std::time::Duration;

/// Lamports per SOL, used throughout to turn the spec's SOL-denominated
/// constants into exact lamport integers.
const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Relayer fee, in basis points of the swap amount. `RELAYER_FEE_PCT =
/// 0.0005` in the spec, i.e. 5 basis points (0.05%).
pub const RELAYER_FEE_BPS: u64 = 5;

/// Fee charged on the deposit leg itself. Always zero; kept as a named
/// constant because it is part of the hashed config surface.
pub const DEPOSIT_FEE_BPS: u64 = 0;

/// Minimum accepted swap amount, in lamports: `MIN_SWAP = 0.03 SOL`.
pub const MIN_SWAP_LAMPORTS: u64 = 3 * LAMPORTS_PER_SOL / 100;

/// Maximum accepted swap amount. The spec defines `MAX_SWAP = ∞`; modeled as
/// `None` so the config-hash encodes "unbounded" rather than an arbitrary
/// sentinel integer.
pub const MAX_SWAP_LAMPORTS: Option<u64> = None;

/// Inclusive bounds on the number of notes (split chunks) a deposit is
/// divided into (`spec.md` §4.4 "Split plan").
pub const MIN_NOTES: u32 = 2;
pub const MAX_NOTES: u32 = 8;

/// Default note count, used only where the split-plan band doesn't pin a
/// more specific value.
pub const DEFAULT_NOTES: u32 = 6;

/// Minimum value of a single note, in lamports: `MIN_SPLIT = 0.01 SOL`.
pub const MIN_SPLIT_LAMPORTS: u64 = LAMPORTS_PER_SOL / 100;

/// Wall-clock bucket width used to group deposits into a [`MixingWindow`](
/// ../../relayer_coordinator/index.html) for co-mingling accounting.
pub const MIXING_WINDOW: Duration = Duration::from_secs(60);

/// Bound, in lamports, of the uniform additive obfuscation jitter applied to
/// each note's amount before it is withdrawn: `OBFUSCATION_RANGE = 0.001
/// SOL`, applied as `[-R, +R]`.
pub const OBFUSCATION_RANGE_LAMPORTS: u64 = LAMPORTS_PER_SOL / 1_000;

/// Number of other deposits that must land after a swap's creation before
/// its emergency recovery path becomes available via the threshold rule.
pub const RECOVERY_THRESHOLD: u32 = 50;

/// Liveness fallback: recovery becomes available once a still-`pending`
/// swap is this old, independent of the threshold rule. `≈150 slots ×
/// 0.4s/slot = 60s`.
pub const RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Lamports reserved in every intermediate/deposit/withdraw/hop wallet to
/// cover the network's per-signature fee plus rent-exemption for a
/// zero-data account: `FEE_RESERVE = 0.0001 SOL`.
pub const FEE_RESERVE_LAMPORTS: u64 = LAMPORTS_PER_SOL / 10_000;

/// Inclusive bounds on the number of hops a merged note makes before
/// reaching the final destination: `H ∈ {1, 2}` uniformly (`spec.md` §4.4
/// step 7).
pub const HOP_COUNT_RANGE: (u32, u32) = (1, 2);

/// How many confirmations a submitted transaction must reach before the
/// Coordinator considers a step durable.
pub const CONFIRMATION_DEPTH: usize = 1;
