//! Assembles the Control Surface's `axum` router: one route per
//! `spec.md` §6 endpoint, wrapped in a permissive CORS layer and an
//! HTTP trace layer (`SPEC_FULL.md` §4.6).

use axum::routing::{get, post};
use axum::Router;
use relayer_chain::SolanaRpc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

pub fn build_router<R: SolanaRpc + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health::<R>))
        .route("/api/swap/config", get(routes::config::config))
        .route("/api/swap/prepare", post(routes::prepare::prepare::<R>))
        .route("/api/swap/initiate", post(routes::initiate::initiate::<R>))
        .route("/api/swap/status/:id", get(routes::status::status::<R>))
        .route(
            "/api/swap/intermediate/:wallet_id",
            get(routes::intermediate::intermediate::<R>),
        )
        .route(
            "/api/swap/recovery/:id",
            get(routes::recovery::recovery_status::<R>).post(routes::recovery::recover::<R>),
        )
        .route("/api/swap/memo/:id", get(routes::memo::memo::<R>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
