//! A fake [`SolanaRpc`] for deterministic tests across crates.
//!
//! Not `cfg(test)`-gated: `relayer-vault`, `relayer-monitor`, and
//! `relayer-coordinator` each need it in their own `#[cfg(test)]` modules,
//! and `cfg(test)` is per-crate (see `relayer_core::clock::test_utils` for
//! the same reasoning).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::transaction::Transaction;

use crate::error::ChainError;
use crate::rpc::SolanaRpc;

/// An in-memory [`SolanaRpc`] that tracks one lamport balance per pubkey and
/// applies every submitted system-program transfer against it, so
/// multi-wallet scenario tests (`relayer-coordinator`'s end-to-end tests)
/// observe real fund movement instead of a single shared number.
pub struct FakeRpc {
    default_balance: AtomicU64,
    balances: Mutex<HashMap<Pubkey, u64>>,
    signatures_confirmed: AtomicBool,
}

impl FakeRpc {
    pub fn new(balance: u64) -> Self {
        Self {
            default_balance: AtomicU64::new(balance),
            balances: Mutex::new(HashMap::new()),
            signatures_confirmed: AtomicBool::new(true),
        }
    }

    pub fn with_signature_confirmed(balance: u64, confirmed: bool) -> Self {
        Self {
            default_balance: AtomicU64::new(balance),
            balances: Mutex::new(HashMap::new()),
            signatures_confirmed: AtomicBool::new(confirmed),
        }
    }

    /// Sets `pubkey`'s tracked balance, independent of every other pubkey's.
    pub fn set_balance(&self, pubkey: Pubkey, balance: u64) {
        self.balances.lock().unwrap().insert(pubkey, balance);
    }

    pub fn set_signature_confirmed(&self, confirmed: bool) {
        self.signatures_confirmed.store(confirmed, Ordering::SeqCst);
    }

    fn balance_of(&self, pubkey: &Pubkey) -> u64 {
        self.balances
            .lock()
            .unwrap()
            .get(pubkey)
            .copied()
            .unwrap_or_else(|| self.default_balance.load(Ordering::SeqCst))
    }

    fn apply_transfer(&self, from: Pubkey, to: Pubkey, lamports: u64) {
        let mut balances = self.balances.lock().unwrap();
        let from_balance = balances
            .get(&from)
            .copied()
            .unwrap_or_else(|| self.default_balance.load(Ordering::SeqCst));
        let to_balance = balances
            .get(&to)
            .copied()
            .unwrap_or_else(|| self.default_balance.load(Ordering::SeqCst));
        balances.insert(from, from_balance.saturating_sub(lamports));
        balances.insert(to, to_balance + lamports);
    }
}

#[async_trait]
impl SolanaRpc for FakeRpc {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.balance_of(pubkey))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        Ok(Hash::default())
    }

    /// Decodes every system-program `Transfer` instruction in `transaction`
    /// and debits/credits the tracked balances accordingly, mirroring what a
    /// real validator does when it executes the transaction.
    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let account_keys = &transaction.message.account_keys;
        for ix in &transaction.message.instructions {
            let program_id = account_keys[ix.program_id_index as usize];
            if program_id != solana_sdk::system_program::id() {
                continue;
            }
            if let Ok(SystemInstruction::Transfer { lamports }) =
                bincode::deserialize::<SystemInstruction>(&ix.data)
            {
                let from = account_keys[ix.accounts[0] as usize];
                let to = account_keys[ix.accounts[1] as usize];
                self.apply_transfer(from, to, lamports);
            }
        }
        Ok(transaction.signatures[0])
    }

    async fn is_signature_confirmed(&self, _signature: &Signature) -> Result<bool, ChainError> {
        Ok(self.signatures_confirmed.load(Ordering::SeqCst))
    }
}
