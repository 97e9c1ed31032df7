//! Solana RPC abstraction and transfer primitives.
//!
//! The rest of the workspace depends on the [`SolanaRpc`] trait, not on
//! `solana-client` directly, so the Vault/Monitor/Coordinator can be tested
//! against a fake (`spec.md` §8: "RPC client is injected").

pub mod error;
pub mod rpc;
pub mod test_utils;
pub mod transfer;

pub use error::ChainError;
pub use rpc::SolanaRpc;
pub use transfer::{build_multi_transfer, build_transfer};
