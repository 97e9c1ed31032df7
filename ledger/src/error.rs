use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("recovery key does not match the hash issued at prepare time")]
    InvalidRecoveryKey,

    #[error("recovery is not available yet: neither threshold nor timeout satisfied")]
    NotAvailable,

    #[error("no recovery record for this swap")]
    NotFound,

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
