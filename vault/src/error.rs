use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("decrypt error: ciphertext or metadata may be corrupted")]
    Decrypt,

    #[error("master key must be 32 bytes of hex-encoded AES-256 key material")]
    InvalidMasterKey,

    #[error("wallet has already been marked used")]
    AlreadyUsed,

    #[error("wallet balance {have} lamports is below the {need} lamport reserve")]
    BelowReserve { have: u64, need: u64 },

    #[error("wallet not found")]
    NotFound,

    #[error("wallet row failed to parse")]
    CorruptRow,

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Chain(#[from] relayer_chain::ChainError),
}
