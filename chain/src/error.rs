use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("transaction was not confirmed within the retry budget")]
    ConfirmationTimeout,

    #[error("transaction simulation failed: {0}")]
    SimulationFailed(String),

    #[error("insufficient lamports: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
}
