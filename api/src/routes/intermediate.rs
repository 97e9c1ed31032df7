use axum::extract::{Path, State};
use axum::Json;
use relayer_chain::SolanaRpc;
use relayer_core::ids::WalletId;

use crate::dto::{lamports_to_sol, IntermediateBalanceResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/swap/intermediate/:walletId` (`spec.md` §6): a live balance
/// lookup, never cached (`spec.md` §4.1 `balance`).
pub async fn intermediate<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Path(wallet_id): Path<String>,
) -> Result<Json<IntermediateBalanceResponse>, ApiError> {
    let wallet_id: WalletId = wallet_id
        .parse()
        .map_err(|_| ApiError::Validation(format!("not a valid wallet id: {wallet_id}")))?;
    let pubkey = state.vault.pubkey_of(wallet_id).await?;
    let balance = state.vault.balance(&pubkey).await?;
    Ok(Json(IntermediateBalanceResponse {
        public_key: pubkey.to_string(),
        balance: lamports_to_sol(balance),
    }))
}
