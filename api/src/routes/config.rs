use axum::Json;
use relayer_core::config_hash::config_hash_hex;
use relayer_core::constants::*;

use crate::dto::{lamports_to_sol, ConfigResponse};

/// `GET /api/swap/config`: the immutable constants plus their config-hash,
/// so a client (or an auditor) can verify the deployed binary's policy
/// (`spec.md` §6, §8 property 6).
pub async fn config() -> Json<ConfigResponse> {
    Json(ConfigResponse {
        relayer_fee_pct: RELAYER_FEE_BPS as f64 / 10_000.0,
        deposit_fee_pct: DEPOSIT_FEE_BPS as f64 / 10_000.0,
        min_swap: lamports_to_sol(MIN_SWAP_LAMPORTS),
        max_swap: MAX_SWAP_LAMPORTS.map(lamports_to_sol),
        max_notes: MAX_NOTES,
        default_notes: DEFAULT_NOTES,
        min_notes: MIN_NOTES,
        mixing_window: MIXING_WINDOW.as_secs(),
        min_split: lamports_to_sol(MIN_SPLIT_LAMPORTS),
        obfuscation_range: lamports_to_sol(OBFUSCATION_RANGE_LAMPORTS),
        recovery_threshold: RECOVERY_THRESHOLD,
        recovery_timeout: RECOVERY_TIMEOUT.as_secs(),
        fee_reserve: lamports_to_sol(FEE_RESERVE_LAMPORTS),
        config_hash: config_hash_hex(),
    })
}
