//! An in-memory [`WalletStore`] for deterministic tests across crates.
//!
//! Not `cfg(test)`-gated for the same reason as
//! `relayer_core::clock::test_utils` and `relayer_chain::test_utils`:
//! `relayer-monitor` and `relayer-coordinator` need it in their own
//! `#[cfg(test)]` modules, and `cfg(test)` does not cross a dependency edge.

use std::sync::Mutex;

use async_trait::async_trait;
use relayer_core::clock::TimestampMillis;
use relayer_core::ids::WalletId;

use crate::error::VaultError;
use crate::wallet::IntermediateWallet;
use crate::store::WalletStore;

#[derive(Default)]
pub struct InMemoryWalletStore {
    rows: Mutex<Vec<IntermediateWallet>>,
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn insert(&self, wallet: &IntermediateWallet) -> Result<(), VaultError> {
        self.rows.lock().unwrap().push(IntermediateWallet {
            id: wallet.id,
            pubkey: wallet.pubkey,
            encrypted_secret_key: wallet.encrypted_secret_key.clone(),
            used: wallet.used,
        });
        Ok(())
    }

    async fn fetch(&self, wallet_id: WalletId) -> Result<IntermediateWallet, VaultError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == wallet_id)
            .map(|w| IntermediateWallet {
                id: w.id,
                pubkey: w.pubkey,
                encrypted_secret_key: w.encrypted_secret_key.clone(),
                used: w.used,
            })
            .ok_or(VaultError::NotFound)
    }

    async fn mark_used(
        &self,
        wallet_id: WalletId,
        _used_at: TimestampMillis,
    ) -> Result<(), VaultError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|w| w.id == wallet_id)
            .ok_or(VaultError::NotFound)?;
        row.used = true;
        Ok(())
    }
}
