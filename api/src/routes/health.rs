use axum::extract::State;
use axum::Json;
use relayer_chain::SolanaRpc;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health<R: SolanaRpc>(State(state): State<AppState<R>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: state.clock.now().as_i64(),
        network: state.network.to_string(),
        privacy_mode: "mixing",
    })
}
