use axum::extract::{Path, State};
use axum::Json;
use relayer_chain::SolanaRpc;
use relayer_core::ids::SwapId;
use relayer_registry::SwapStatus;

use crate::dto::{parse_pubkey, RecoverRequest, RecoverResponse, RecoveryAvailabilityResponse};
use crate::error::ApiError;
use crate::state::AppState;

fn parse_swap_id(raw: &str) -> Result<SwapId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("not a valid transaction id: {raw}")))
}

/// `GET /api/swap/recovery/:id` (`spec.md` §6): evaluates, but does not
/// consume, emergency recovery availability.
pub async fn recovery_status<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<RecoveryAvailabilityResponse>, ApiError> {
    let transaction_id = parse_swap_id(&id)?;
    let swap = state.registry.get_swap(transaction_id).await?;
    let availability = state
        .ledger
        .availability(
            transaction_id,
            swap.created_at,
            swap.status == SwapStatus::Pending,
            state.clock.as_ref(),
        )
        .await?;
    Ok(Json(availability.into()))
}

/// `POST /api/swap/recovery/:id` (`spec.md` §6): consumes the recovery key
/// and, if available, dispatches the emergency direct withdrawal.
pub async fn recover<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Json(req): Json<RecoverRequest>,
) -> Result<Json<RecoverResponse>, ApiError> {
    let transaction_id = parse_swap_id(&id)?;
    let destination = parse_pubkey("destinationWallet", &req.destination_wallet)?;

    let signature = state
        .coordinator
        .recover(transaction_id, &req.recovery_key, &destination)
        .await?;

    Ok(Json(RecoverResponse { success: true, tx_signature: signature.to_string() }))
}
