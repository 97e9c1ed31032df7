use axum::extract::{Path, State};
use axum::Json;
use relayer_chain::SolanaRpc;
use relayer_core::ids::SwapId;

use crate::dto::SwapStatusResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/swap/status/:id` (`spec.md` §6): the full swap row with its
/// `steps[]` in execution order.
pub async fn status<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<SwapStatusResponse>, ApiError> {
    let transaction_id: SwapId = id
        .parse()
        .map_err(|_| ApiError::Validation(format!("not a valid transaction id: {id}")))?;
    let swap = state.registry.get_swap(transaction_id).await?;
    Ok(Json(swap.into()))
}
