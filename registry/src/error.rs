use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("swap not found")]
    SwapNotFound,

    #[error("memo not found")]
    MemoNotFound,

    #[error(
        "status transition precondition violated: expected {expected}, swap is a bug if this fires"
    )]
    StatusConflict { expected: String },

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
