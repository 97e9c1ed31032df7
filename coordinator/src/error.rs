use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(
        "could not fund a freshly allocated wallet's reserve: funding source is below reserve \
         and no treasury fallback is configured (or the treasury transfer itself failed)"
    )]
    CannotPrime,

    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },

    #[error("recovery is not available: neither threshold nor timeout satisfied ({details})")]
    RecoveryNotAvailable { details: String },

    #[error("recovery key does not match the hash issued at prepare time")]
    InvalidRecoveryKey,

    #[error("swap's destination address is not a valid base58 public key: {0}")]
    InvalidAddress(String),

    #[error(
        "recovery refused: the first intermediate wallet no longer holds the deposited \
         balance, funds have already started moving"
    )]
    FundsAlreadyMoving,

    #[error(transparent)]
    Chain(#[from] relayer_chain::ChainError),

    #[error(transparent)]
    Vault(#[from] relayer_vault::VaultError),

    #[error(transparent)]
    Registry(#[from] relayer_registry::RegistryError),

    #[error(transparent)]
    Ledger(#[from] relayer_ledger::LedgerError),
}

impl CoordinatorError {
    /// Maps a recovery-path [`relayer_ledger::LedgerError`] onto the more
    /// specific recovery variants the Control Surface distinguishes
    /// (`spec.md` §7), rather than the generic passthrough `#[from]` above.
    pub(crate) fn from_recovery_ledger(err: relayer_ledger::LedgerError) -> Self {
        match err {
            relayer_ledger::LedgerError::InvalidRecoveryKey => Self::InvalidRecoveryKey,
            other => Self::Ledger(other),
        }
    }
}
