//! In-memory [`LedgerStore`] for tests that need a real storage seam without
//! a Postgres instance — e.g. `relayer-coordinator`'s end-to-end recovery
//! scenario tests. Mirrors `relayer-registry`'s `InMemorySwapStore`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use relayer_core::ids::SwapId;

use crate::error::LedgerError;
use crate::store::{LedgerStore, RecoveryRecord};

#[derive(Default)]
pub struct InMemoryLedgerStore {
    deposit_count: Mutex<u64>,
    records: Mutex<HashMap<SwapId, RecoveryRecord>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn increment_deposit_counter(&self) -> Result<u64, LedgerError> {
        let mut count = self.deposit_count.lock().unwrap();
        *count += 1;
        Ok(*count)
    }

    async fn current_deposit_count(&self) -> Result<u64, LedgerError> {
        Ok(*self.deposit_count.lock().unwrap())
    }

    async fn open_recovery_record(
        &self,
        transaction_id: SwapId,
        deposit_count_at_creation: u64,
        recovery_key_hash: &str,
    ) -> Result<(), LedgerError> {
        self.records
            .lock()
            .unwrap()
            .entry(transaction_id)
            .or_insert(RecoveryRecord {
                deposit_count_at_creation,
                recovery_key_hash: recovery_key_hash.to_string(),
                recovery_available: false,
                available_reason: None,
            });
        Ok(())
    }

    async fn get_recovery_record(&self, transaction_id: SwapId) -> Result<RecoveryRecord, LedgerError> {
        self.records
            .lock()
            .unwrap()
            .get(&transaction_id)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    async fn mark_available(&self, transaction_id: SwapId, reason: &str) -> Result<(), LedgerError> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&transaction_id).ok_or(LedgerError::NotFound)?;
        record.recovery_available = true;
        record.available_reason = Some(reason.to_string());
        Ok(())
    }
}
