use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::error::ChainError;

/// The subset of Solana JSON-RPC behavior the relayer depends on.
///
/// Grounded on the production `WithdrawalService`/`TransferService` shape
/// seen across the retrieved relayer examples: a thin wrapper around
/// `solana-client` exposing only blockhash fetch, balance, submit, and
/// confirm. Kept as a trait so the Vault/Monitor/Coordinator can run against
/// a fake in tests (`spec.md` §8).
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ChainError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError>;

    /// Submits a transaction and waits until it reaches
    /// [`crate::transfer::CONFIRMATION_DEPTH`]-equivalent commitment,
    /// retrying transient RPC failures with the shared backoff policy.
    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, ChainError>;

    /// Reports whether `signature` has reached `confirmed` commitment.
    /// Used by the Deposit Monitor to verify a user-supplied source
    /// transaction before admitting its swap (`spec.md` §4.3).
    async fn is_signature_confirmed(&self, signature: &Signature) -> Result<bool, ChainError>;
}

/// Production adapter over `solana_client::nonblocking::rpc_client::RpcClient`.
pub struct RpcClientAdapter {
    inner: RpcClient,
}

impl RpcClientAdapter {
    pub fn new(rpc_url: String) -> Self {
        Self {
            inner: RpcClient::new(rpc_url),
        }
    }
}

#[async_trait]
impl SolanaRpc for RpcClientAdapter {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.inner.get_balance(pubkey).await?)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        Ok(self.inner.get_latest_blockhash().await?)
    }

    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, ChainError> {
        let mut backoff = relayer_core::backoff::get_backoff_iter();
        let mut attempts_left = 5u32;
        loop {
            let result = self
                .inner
                .send_and_confirm_transaction_with_spinner_and_config(
                    transaction,
                    self.inner.commitment(),
                    RpcSendTransactionConfig {
                        skip_preflight: false,
                        ..Default::default()
                    },
                )
                .await;

            match result {
                Ok(signature) => return Ok(signature),
                Err(err) if attempts_left > 1 => {
                    attempts_left -= 1;
                    tracing::warn!(
                        error = %err,
                        attempts_left,
                        "transaction submission failed, retrying"
                    );
                    tokio::time::sleep(backoff.next().unwrap()).await;
                }
                Err(err) => return Err(ChainError::Rpc(err)),
            }
        }
    }

    async fn is_signature_confirmed(&self, signature: &Signature) -> Result<bool, ChainError> {
        let statuses = self
            .inner
            .get_signature_statuses(std::slice::from_ref(signature))
            .await?
            .value;
        Ok(statuses
            .into_iter()
            .next()
            .flatten()
            .map(|status| status.satisfies_commitment(self.inner.commitment()))
            .unwrap_or(false))
    }
}
