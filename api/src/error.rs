//! Maps every domain error variant the Control Surface can see onto the
//! `(StatusCode, {error})` pairs of `spec.md` §7. Internal detail (RPC error
//! text, SQL errors) is logged via `tracing::error!` and never crosses the
//! HTTP boundary beyond the error's kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("recovery key does not match the hash issued at prepare time")]
    InvalidRecoveryKey,

    #[error("recovery is not available: {details}")]
    RecoveryNotAvailable { reason: &'static str, details: String },

    #[error("status transition precondition violated")]
    StatusConflict,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct RecoveryNotAvailableBody {
    error: String,
    reason: &'static str,
    details: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: msg.clone() })).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody { error: msg.clone() })).into_response()
            }
            ApiError::InvalidRecoveryKey => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error: self.to_string() }),
            )
                .into_response(),
            ApiError::RecoveryNotAvailable { reason, details } => (
                StatusCode::BAD_REQUEST,
                Json(RecoveryNotAvailableBody {
                    error: "recovery not available".to_string(),
                    reason,
                    details: details.clone(),
                }),
            )
                .into_response(),
            ApiError::StatusConflict => {
                tracing::error!("status transition conflict, this is a bug");
                (
                    StatusCode::CONFLICT,
                    Json(ErrorBody { error: self.to_string() }),
                )
                    .into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody { error: "internal error".to_string() }),
                )
                    .into_response()
            }
        }
    }
}

impl From<relayer_registry::RegistryError> for ApiError {
    fn from(err: relayer_registry::RegistryError) -> Self {
        use relayer_registry::RegistryError as E;
        match err {
            E::SwapNotFound => ApiError::NotFound("swap not found".to_string()),
            E::MemoNotFound => ApiError::NotFound("memo not found".to_string()),
            E::StatusConflict { .. } => ApiError::StatusConflict,
            E::Db(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<relayer_vault::VaultError> for ApiError {
    fn from(err: relayer_vault::VaultError) -> Self {
        match err {
            relayer_vault::VaultError::NotFound => {
                ApiError::NotFound("wallet not found".to_string())
            }
            other => ApiError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl From<relayer_ledger::LedgerError> for ApiError {
    fn from(err: relayer_ledger::LedgerError) -> Self {
        use relayer_ledger::LedgerError as E;
        match err {
            E::InvalidRecoveryKey => ApiError::InvalidRecoveryKey,
            E::NotFound => ApiError::NotFound("no recovery record for this swap".to_string()),
            E::NotAvailable => ApiError::RecoveryNotAvailable {
                reason: "none",
                details: "neither threshold nor timeout satisfied".to_string(),
            },
            E::Db(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<relayer_coordinator::CoordinatorError> for ApiError {
    fn from(err: relayer_coordinator::CoordinatorError) -> Self {
        use relayer_coordinator::CoordinatorError as E;
        match err {
            E::InvalidRecoveryKey => ApiError::InvalidRecoveryKey,
            E::RecoveryNotAvailable { details } => {
                ApiError::RecoveryNotAvailable { reason: "none", details }
            }
            E::FundsAlreadyMoving => ApiError::RecoveryNotAvailable {
                reason: "funds_already_moving",
                details: "the first intermediate wallet no longer holds the deposited balance"
                    .to_string(),
            },
            E::InvalidAddress(addr) => {
                ApiError::Validation(format!("invalid destination address: {addr}"))
            }
            other => ApiError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl From<relayer_chain::ChainError> for ApiError {
    fn from(err: relayer_chain::ChainError) -> Self {
        ApiError::Internal(anyhow::anyhow!(err))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let resp = ApiError::Validation("bad".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::NotFound("missing".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_recovery_key_maps_to_400() {
        let resp = ApiError::InvalidRecoveryKey.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn recovery_not_available_maps_to_400() {
        let resp = ApiError::RecoveryNotAvailable { reason: "none", details: "nope".to_string() }
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn status_conflict_maps_to_409() {
        let resp = ApiError::StatusConflict.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_maps_to_500_and_hides_detail() {
        let resp = ApiError::Internal(anyhow::anyhow!("db connection reset")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn registry_swap_not_found_maps_to_api_not_found() {
        let err: ApiError = relayer_registry::RegistryError::SwapNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn ledger_not_available_maps_to_recovery_not_available() {
        let err: ApiError = relayer_ledger::LedgerError::NotAvailable.into();
        assert!(matches!(err, ApiError::RecoveryNotAvailable { .. }));
    }
}
