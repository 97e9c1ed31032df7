//! In-memory [`SwapStore`] for tests that need a real storage seam without a
//! Postgres instance — e.g. `relayer-coordinator`'s end-to-end scenario
//! tests. Mirrors `relayer-vault`'s `InMemoryWalletStore`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use relayer_core::clock::TimestampMillis;
use relayer_core::ids::SwapId;

use crate::error::RegistryError;
use crate::store::SwapStore;
use crate::types::{
    EncryptedMemo, MixingWindow, NewMemo, NewStep, NewSwap, Swap, SwapStatus, SwapStep,
};

#[derive(Default)]
struct State {
    swaps: HashMap<SwapId, Swap>,
    windows: HashMap<String, MixingWindow>,
    memos: HashMap<SwapId, EncryptedMemo>,
}

#[derive(Default)]
pub struct InMemorySwapStore {
    state: Mutex<State>,
}

impl InMemorySwapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SwapStore for InMemorySwapStore {
    async fn create_swap(&self, new_swap: NewSwap) -> Result<(), RegistryError> {
        let mut state = self.state.lock().unwrap();
        state.swaps.insert(
            new_swap.transaction_id,
            Swap {
                transaction_id: new_swap.transaction_id,
                source_addr: new_swap.source_addr,
                dest_addr: new_swap.dest_addr,
                amount_lamports: new_swap.amount_lamports,
                intermediate_wallet_id: new_swap.intermediate_wallet_id,
                source_sig: new_swap.source_sig,
                status: SwapStatus::Pending,
                relayer_fee_lamports: new_swap.relayer_fee_lamports,
                final_sig: None,
                config_hash: new_swap.config_hash,
                created_at: TimestampMillis::from_millis(0),
                completed_at: None,
                error: None,
                steps: Vec::new(),
            },
        );
        Ok(())
    }

    async fn append_step(&self, transaction_id: SwapId, step: NewStep) -> Result<i32, RegistryError> {
        let mut state = self.state.lock().unwrap();
        let swap = state
            .swaps
            .get_mut(&transaction_id)
            .ok_or(RegistryError::SwapNotFound)?;
        let step_index = swap.steps.len() as i32;
        swap.steps.push(SwapStep {
            transaction_id,
            step_index,
            from_addr: step.from_addr,
            to_addr: step.to_addr,
            tx_sig: step.tx_sig,
            amount_lamports: step.amount_lamports,
            recorded_at: TimestampMillis::from_millis(0),
        });
        Ok(step_index)
    }

    async fn transition_status(
        &self,
        transaction_id: SwapId,
        from: SwapStatus,
        to: SwapStatus,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().unwrap();
        let swap = state
            .swaps
            .get_mut(&transaction_id)
            .ok_or(RegistryError::SwapNotFound)?;
        if swap.status != from {
            return Err(RegistryError::StatusConflict {
                expected: from.as_db_str().to_string(),
            });
        }
        swap.status = to;
        Ok(())
    }

    async fn set_error(&self, transaction_id: SwapId, message: &str) -> Result<(), RegistryError> {
        let mut state = self.state.lock().unwrap();
        let swap = state
            .swaps
            .get_mut(&transaction_id)
            .ok_or(RegistryError::SwapNotFound)?;
        swap.error = Some(message.to_string());
        Ok(())
    }

    async fn set_final_sig(&self, transaction_id: SwapId, final_sig: &str) -> Result<(), RegistryError> {
        let mut state = self.state.lock().unwrap();
        let swap = state
            .swaps
            .get_mut(&transaction_id)
            .ok_or(RegistryError::SwapNotFound)?;
        swap.final_sig = Some(final_sig.to_string());
        swap.completed_at = Some(TimestampMillis::from_millis(0));
        Ok(())
    }

    async fn upsert_window(
        &self,
        window_id: &str,
        start: TimestampMillis,
        end: TimestampMillis,
        amount_lamports: u64,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().unwrap();
        state
            .windows
            .entry(window_id.to_string())
            .and_modify(|w| {
                w.total_amount_lamports += amount_lamports;
                w.tx_count += 1;
            })
            .or_insert(MixingWindow {
                window_id: window_id.to_string(),
                start,
                end,
                total_amount_lamports: amount_lamports,
                tx_count: 1,
            });
        Ok(())
    }

    async fn get_window(&self, window_id: &str) -> Result<Option<MixingWindow>, RegistryError> {
        Ok(self.state.lock().unwrap().windows.get(window_id).cloned())
    }

    async fn store_memo(&self, memo: NewMemo) -> Result<(), RegistryError> {
        self.state.lock().unwrap().memos.insert(
            memo.transaction_id,
            EncryptedMemo {
                memo_id: memo.memo_id,
                transaction_id: memo.transaction_id,
                ciphertext: memo.ciphertext,
                metadata: memo.metadata,
            },
        );
        Ok(())
    }

    async fn get_memo(&self, transaction_id: SwapId) -> Result<EncryptedMemo, RegistryError> {
        self.state
            .lock()
            .unwrap()
            .memos
            .get(&transaction_id)
            .cloned()
            .ok_or(RegistryError::MemoNotFound)
    }

    async fn get_swap(&self, transaction_id: SwapId) -> Result<Swap, RegistryError> {
        self.state
            .lock()
            .unwrap()
            .swaps
            .get(&transaction_id)
            .cloned()
            .ok_or(RegistryError::SwapNotFound)
    }

    async fn oldest_pending(&self, limit: i64) -> Result<Vec<Swap>, RegistryError> {
        let state = self.state.lock().unwrap();
        let mut pending: Vec<Swap> = state
            .swaps
            .values()
            .filter(|s| s.status == SwapStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|s| s.created_at.as_i64());
        pending.truncate(limit as usize);
        Ok(pending)
    }
}
