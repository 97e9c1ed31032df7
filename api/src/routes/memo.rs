use axum::extract::{Path, State};
use axum::Json;
use relayer_chain::SolanaRpc;
use relayer_core::ids::SwapId;

use crate::dto::MemoResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/swap/memo/:id` (`spec.md` §6): returns the opaque
/// encrypted-memo blob verbatim; the server never decrypts it.
pub async fn memo<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<MemoResponse>, ApiError> {
    let transaction_id: SwapId = id
        .parse()
        .map_err(|_| ApiError::Validation(format!("not a valid transaction id: {id}")))?;
    let memo = state.registry.get_memo(transaction_id).await?;
    Ok(Json(MemoResponse {
        encrypted: hex::encode(memo.ciphertext),
        metadata: memo.metadata,
    }))
}
