//! Wallet Vault: custodial key material and AEAD at-rest encryption for
//! intermediate wallets.

pub mod aead;
pub mod error;
pub mod store;
pub mod test_utils;
pub mod wallet;

pub use aead::MasterKey;
pub use error::VaultError;
pub use store::{PgWalletStore, WalletStore};
pub use wallet::{IntermediateWallet, TransferOutcome, Vault};
