//! Swap Registry: durable, atomic storage for everything the Mixing
//! Coordinator touches (`spec.md` §4.5). The Coordinator holds no cache —
//! every read and write goes through here.
//!
//! `Registry` itself is a thin handle around a [`SwapStore`]; the storage
//! logic lives in `store.rs` so the Coordinator's end-to-end tests can run
//! against [`crate::test_utils::InMemorySwapStore`] instead of a live
//! Postgres instance, mirroring `relayer-vault`'s `Vault`/`WalletStore`
//! split.

use std::sync::Arc;

use relayer_core::clock::TimestampMillis;
use relayer_core::ids::SwapId;
use sqlx::PgPool;

use crate::error::RegistryError;
use crate::store::{PgSwapStore, SwapStore};
use crate::types::{EncryptedMemo, MixingWindow, NewMemo, NewStep, NewSwap, Swap, SwapStatus};

pub struct Registry {
    store: Arc<dyn SwapStore>,
}

impl Registry {
    pub async fn connect(database_url: &str) -> Result<Self, RegistryError> {
        let store = PgSwapStore::connect(database_url).await?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            store: Arc::new(PgSwapStore::from_pool(pool)),
        }
    }

    /// Builds a [`Registry`] over an arbitrary [`SwapStore`] — used by tests
    /// to inject an in-memory fake.
    pub fn from_store(store: Arc<dyn SwapStore>) -> Self {
        Self { store }
    }

    /// Inserts a new swap with status `pending`.
    pub async fn create_swap(&self, new_swap: NewSwap) -> Result<(), RegistryError> {
        self.store.create_swap(new_swap).await
    }

    /// Appends a step with the next sequential `step_index` for this swap,
    /// computed atomically in the same statement as the insert.
    pub async fn append_step(
        &self,
        transaction_id: SwapId,
        step: NewStep,
    ) -> Result<i32, RegistryError> {
        self.store.append_step(transaction_id, step).await
    }

    /// Atomically transitions `transaction_id` from `from` to `to`. Fails
    /// with [`RegistryError::StatusConflict`] if the swap's current status
    /// isn't `from` — a genuine race, not to be silently ignored
    /// (`spec.md` §9 "Atomic status transitions").
    pub async fn transition_status(
        &self,
        transaction_id: SwapId,
        from: SwapStatus,
        to: SwapStatus,
    ) -> Result<(), RegistryError> {
        self.store.transition_status(transaction_id, from, to).await
    }

    pub async fn set_error(
        &self,
        transaction_id: SwapId,
        message: &str,
    ) -> Result<(), RegistryError> {
        self.store.set_error(transaction_id, message).await
    }

    pub async fn set_final_sig(
        &self,
        transaction_id: SwapId,
        final_sig: &str,
    ) -> Result<(), RegistryError> {
        self.store.set_final_sig(transaction_id, final_sig).await
    }

    /// Creates or updates the `MixingWindow` for `window_id`, adding
    /// `amount_lamports` to its total and incrementing `tx_count` by one
    /// (`spec.md` §4.4 "Mixing window assignment").
    pub async fn upsert_window(
        &self,
        window_id: &str,
        start: TimestampMillis,
        end: TimestampMillis,
        amount_lamports: u64,
    ) -> Result<(), RegistryError> {
        self.store
            .upsert_window(window_id, start, end, amount_lamports)
            .await
    }

    pub async fn get_window(&self, window_id: &str) -> Result<Option<MixingWindow>, RegistryError> {
        self.store.get_window(window_id).await
    }

    pub async fn store_memo(&self, memo: NewMemo) -> Result<(), RegistryError> {
        self.store.store_memo(memo).await
    }

    pub async fn get_memo(&self, transaction_id: SwapId) -> Result<EncryptedMemo, RegistryError> {
        self.store.get_memo(transaction_id).await
    }

    /// Fetches a swap with its full `steps[]`, in execution order
    /// (`spec.md` §6 `GET /api/swap/status/:id`).
    pub async fn get_swap(&self, transaction_id: SwapId) -> Result<Swap, RegistryError> {
        self.store.get_swap(transaction_id).await
    }

    /// Selects up to `limit` of the oldest `pending` swaps, for the Deposit
    /// Monitor's admission poll (`spec.md` §4.3).
    pub async fn oldest_pending(&self, limit: i64) -> Result<Vec<Swap>, RegistryError> {
        self.store.oldest_pending(limit).await
    }
}
