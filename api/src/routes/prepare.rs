use axum::extract::State;
use axum::Json;
use relayer_chain::SolanaRpc;
use relayer_core::constants::FEE_RESERVE_LAMPORTS;
use relayer_core::rng::{RngCore, SysRng};
use relayer_ledger::RecoveryLedger;

use crate::dto::{
    lamports_to_sol, parse_pubkey, sol_to_lamports, validate_swap_amount, DepositInstructions,
    IntermediateWalletDto, PrepareRequest, PrepareResponse, RecoveryGrant,
};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/swap/prepare` (`spec.md` §6): allocates a single-use
/// intermediate wallet and mints a recovery key for the caller to hold onto.
/// No swap row exists yet — that happens at `/api/swap/initiate`, once the
/// deposit transaction signature is known.
pub async fn prepare<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, ApiError> {
    parse_pubkey("sourceWallet", &req.source_wallet)?;
    parse_pubkey("destinationWallet", &req.destination_wallet)?;

    let amount_lamports = sol_to_lamports(req.amount)?;
    validate_swap_amount(amount_lamports)?;

    let mut rng = SysRng::new();
    let (wallet_id, pubkey) = state.vault.allocate(&mut rng).await?;

    let fee_lamports = relayer_coordinator::compute_relayer_fee_lamports(amount_lamports);

    let mut recovery_key_bytes = [0u8; 32];
    rng.fill_bytes(&mut recovery_key_bytes);
    let recovery_key = hex::encode(recovery_key_bytes);
    let recovery_key_hash = RecoveryLedger::hash_recovery_key(&recovery_key);

    Ok(Json(PrepareResponse {
        intermediate_wallet: IntermediateWalletDto {
            public_key: pubkey.to_string(),
            wallet_id,
        },
        fee: lamports_to_sol(fee_lamports),
        recovery: RecoveryGrant {
            recovery_key,
            recovery_key_hash,
            threshold: relayer_core::constants::RECOVERY_THRESHOLD,
        },
        instructions: DepositInstructions {
            recipient: pubkey.to_string(),
            minimum_lamports: amount_lamports + FEE_RESERVE_LAMPORTS,
            memo: format!(
                "Send at least {} SOL to {pubkey} before calling /api/swap/initiate with the resulting transaction signature",
                lamports_to_sol(amount_lamports + FEE_RESERVE_LAMPORTS)
            ),
        },
    }))
}
