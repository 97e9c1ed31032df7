//! Control Surface: thin `axum` request handlers that validate input and
//! delegate to the Vault, Registry, Recovery Ledger, and Mixing Coordinator
//! (`spec.md` §4.6). No business logic lives here.

pub mod dto;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
