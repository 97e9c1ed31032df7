//! `MonitorError` is deliberately unused outside tests: a tick never
//! propagates a failure (`SPEC_FULL.md` §7) — it logs via `tracing::warn!`
//! and retries on the next tick. Kept as a type so admission failures can
//! still be asserted on in unit tests without a panic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Chain(#[from] relayer_chain::ChainError),

    #[error(transparent)]
    Vault(#[from] relayer_vault::VaultError),

    #[error(transparent)]
    Registry(#[from] relayer_registry::RegistryError),

    #[error("source signature {0:?} does not parse as a Solana signature")]
    BadSignature(String),
}
