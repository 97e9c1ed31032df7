//! Intermediate wallet lifecycle: allocation, encrypted storage, signing,
//! and balance/reserve accounting (`spec.md` §4.1).

use std::sync::Arc;

use relayer_chain::SolanaRpc;
use relayer_core::clock::Clock;
use relayer_core::constants::FEE_RESERVE_LAMPORTS;
use relayer_core::ids::WalletId;
use relayer_core::rng::Crng;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use zeroize::Zeroizing;

use crate::aead::MasterKey;
use crate::error::VaultError;
use crate::store::WalletStore;

/// An intermediate wallet: an ephemeral keypair the Coordinator routes a
/// split chunk through on its way to the final destination.
pub struct IntermediateWallet {
    pub id: WalletId,
    pub pubkey: Pubkey,
    /// `nonce(12) || tag(16) || ciphertext` over the 64-byte secret key.
    pub encrypted_secret_key: Vec<u8>,
    pub used: bool,
}

/// Outcome of a (possibly multi-recipient) signed transfer.
pub struct TransferOutcome {
    pub signature: Signature,
    /// Actual lamports delivered to each recipient, in the order passed to
    /// [`Vault::sign_and_submit_transfer`]. Equal to the requested amounts
    /// unless `scaled` is `true`.
    pub amounts: Vec<u64>,
    /// Set when the requested sum exceeded the wallet's payable balance and
    /// every requested amount was scaled down uniformly to fit
    /// (`spec.md` §4.1 "For multi-recipient calls...").
    pub scaled: bool,
}

/// Owns the master key and every intermediate wallet's persisted secret, so
/// no other crate ever holds a raw private key (`spec.md` §3 "Ownership":
/// "the Coordinator borrows signing authority via wallet_id handles; it
/// never sees raw keys").
pub struct Vault<R: SolanaRpc> {
    master_key: MasterKey,
    rpc: Arc<R>,
    store: Arc<dyn WalletStore>,
}

impl<R: SolanaRpc> Vault<R> {
    pub fn new(master_key: MasterKey, rpc: Arc<R>, store: Arc<dyn WalletStore>) -> Self {
        Self { master_key, rpc, store }
    }

    /// Generates a new intermediate wallet keypair, encrypts its secret key
    /// under the master key bound to the wallet id as AAD, and persists the
    /// row. Returns the opaque handle the rest of the workspace uses to
    /// refer to this wallet.
    #[tracing::instrument(skip_all, name = "(allocate)")]
    pub async fn allocate(
        &self,
        rng: &mut impl Crng,
    ) -> Result<(WalletId, Pubkey), VaultError> {
        let id = WalletId::new(rng);
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let secret_key_bytes = Zeroizing::new(keypair.to_bytes());

        let encrypted_secret_key = self.master_key.encrypt(
            rng,
            &id.as_uuid().into_bytes(),
            &secret_key_bytes[..],
        );

        let wallet = IntermediateWallet {
            id,
            pubkey,
            encrypted_secret_key,
            used: false,
        };
        self.store.insert(&wallet).await?;
        tracing::debug!(wallet_id = %id, %pubkey, "allocated intermediate wallet");
        Ok((id, pubkey))
    }

    /// Signs + submits a transfer from `wallet_id` to a single `recipient`.
    /// Convenience wrapper over [`Vault::sign_and_submit_transfer`].
    pub async fn sign_and_submit_single(
        &self,
        wallet_id: WalletId,
        recipient: &Pubkey,
        lamports: u64,
    ) -> Result<TransferOutcome, VaultError> {
        self.sign_and_submit_transfer(wallet_id, &[(*recipient, lamports)])
            .await
    }

    /// Decrypts `wallet_id`'s secret key and signs + submits a transfer to
    /// one or more `recipients` (`spec.md` §4.1 `sign_transfer`).
    ///
    /// Refuses to sign if the wallet is already marked used — defense in
    /// depth against a Coordinator bug re-using a wallet (`spec.md` §5
    /// "Shared-resource policy"). If the requested sum exceeds the wallet's
    /// payable balance, every recipient's amount is scaled down uniformly
    /// (preserving split ratios) so the transaction fits; the scaled
    /// amounts and a `scaled` flag are reported back in
    /// [`TransferOutcome`]. Fails with [`VaultError::BelowReserve`] only
    /// when the payable balance is zero.
    #[tracing::instrument(skip_all, name = "(sign_and_submit_transfer)")]
    pub async fn sign_and_submit_transfer(
        &self,
        wallet_id: WalletId,
        recipients: &[(Pubkey, u64)],
    ) -> Result<TransferOutcome, VaultError> {
        assert!(!recipients.is_empty(), "sign_and_submit_transfer: empty recipients");

        let wallet = self.store.fetch(wallet_id).await?;
        if wallet.used {
            return Err(VaultError::AlreadyUsed);
        }

        let balance = self.rpc.get_balance(&wallet.pubkey).await?;
        let callable = self.payable_balance(balance);
        if callable == 0 {
            return Err(VaultError::BelowReserve {
                have: balance,
                need: FEE_RESERVE_LAMPORTS,
            });
        }

        let requested: Vec<u64> = recipients.iter().map(|(_, l)| *l).collect();
        let (amounts, scaled) = scale_to_callable(&requested, callable);

        let secret_key_bytes = self.master_key.decrypt(
            &wallet.id.as_uuid().into_bytes(),
            &wallet.encrypted_secret_key,
        )?;
        let keypair = Keypair::from_bytes(&secret_key_bytes)
            .map_err(|_| VaultError::Decrypt)?;

        let scaled_recipients: Vec<(Pubkey, u64)> = recipients
            .iter()
            .zip(amounts.iter())
            .map(|((pubkey, _), amount)| (*pubkey, *amount))
            .collect();

        let recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = relayer_chain::build_multi_transfer(
            &keypair,
            &scaled_recipients,
            recent_blockhash,
        );

        let signature = self.rpc.send_and_confirm(&transaction).await?;
        tracing::debug!(wallet_id = %wallet.id, %signature, scaled, "submitted transfer");
        Ok(TransferOutcome { signature, amounts, scaled })
    }

    /// The current on-chain balance of `pubkey`. Always a live RPC lookup,
    /// never cached (`spec.md` §4.1 `balance`).
    pub async fn balance(&self, pubkey: &Pubkey) -> Result<u64, VaultError> {
        Ok(self.rpc.get_balance(pubkey).await?)
    }

    /// The public key of a wallet handle, for callers (the Deposit Monitor)
    /// that need to check a balance without touching the encrypted secret.
    pub async fn pubkey_of(&self, wallet_id: WalletId) -> Result<Pubkey, VaultError> {
        Ok(self.store.fetch(wallet_id).await?.pubkey)
    }

    /// Marks `wallet_id` single-use-exhausted. A wallet that appears as
    /// `from_addr` in a completed step must have `active = false`
    /// (`spec.md` §3 invariants).
    #[tracing::instrument(skip_all, name = "(mark_used)")]
    pub async fn mark_used(
        &self,
        wallet_id: WalletId,
        clock: &dyn Clock,
    ) -> Result<(), VaultError> {
        self.store.mark_used(wallet_id, clock.now()).await?;
        tracing::debug!(%wallet_id, "marked wallet used");
        Ok(())
    }

    /// The full amount payable out of a wallet with `balance_lamports` after
    /// reserving rent and fees. `FEE_RESERVE_LAMPORTS` is read as the
    /// *combined* network-fee + rent-exemption reserve named by the
    /// glossary's "Fee reserve" entry, not just the signature fee alone —
    /// see `DESIGN.md` for why that reading was picked over treating rent
    /// exemption as a second, separate deduction.
    pub fn payable_balance(&self, balance_lamports: u64) -> u64 {
        balance_lamports.saturating_sub(FEE_RESERVE_LAMPORTS)
    }
}

/// Scales `requested` amounts down uniformly so their sum fits within
/// `callable`, preserving ratios exactly under integer rounding (any
/// remainder from rounding is absorbed by the last entry so the scaled sum
/// is exactly `min(sum(requested), callable)`).
fn scale_to_callable(requested: &[u64], callable: u64) -> (Vec<u64>, bool) {
    let total: u128 = requested.iter().map(|&x| u128::from(x)).sum();
    if total == 0 || total <= u128::from(callable) {
        return (requested.to_vec(), false);
    }

    let mut out = Vec::with_capacity(requested.len());
    let mut allocated: u128 = 0;
    for (index, &amount) in requested.iter().enumerate() {
        if index + 1 == requested.len() {
            out.push((u128::from(callable) - allocated) as u64);
        } else {
            let share = (u128::from(amount) * u128::from(callable)) / total;
            allocated += share;
            out.push(share as u64);
        }
    }
    (out, true)
}

#[cfg(test)]
mod test {
    use relayer_chain::test_utils::FakeRpc;
    use relayer_core::clock::test_utils::FakeClock;
    use relayer_core::clock::TimestampMillis;
    use relayer_core::rng::SysRng;

    use crate::test_utils::InMemoryWalletStore;

    use super::*;

    fn test_vault(balance: u64) -> Vault<FakeRpc> {
        let master_key = MasterKey::from_bytes(&[1u8; 32]).unwrap();
        let rpc = Arc::new(FakeRpc::new(balance));
        let store: Arc<dyn WalletStore> = Arc::new(InMemoryWalletStore::default());
        Vault::new(master_key, rpc, store)
    }

    #[tokio::test]
    async fn allocate_then_transfer_roundtrips_key() {
        let vault = test_vault(10 * FEE_RESERVE_LAMPORTS);
        let mut rng = SysRng::new();

        let (wallet_id, _pubkey) = vault.allocate(&mut rng).await.unwrap();
        let recipient = Pubkey::new_unique();
        let outcome = vault
            .sign_and_submit_single(wallet_id, &recipient, FEE_RESERVE_LAMPORTS)
            .await
            .unwrap();
        assert_ne!(outcome.signature, Signature::default());
        assert!(!outcome.scaled);
        assert_eq!(outcome.amounts, vec![FEE_RESERVE_LAMPORTS]);
    }

    #[tokio::test]
    async fn transfer_rejects_below_reserve_when_callable_is_zero() {
        let vault = test_vault(100);
        let mut rng = SysRng::new();

        let (wallet_id, _) = vault.allocate(&mut rng).await.unwrap();
        let recipient = Pubkey::new_unique();
        let err = vault
            .sign_and_submit_single(wallet_id, &recipient, 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::BelowReserve { .. }));
    }

    #[tokio::test]
    async fn transfer_scales_down_when_requested_exceeds_callable() {
        let vault = test_vault(FEE_RESERVE_LAMPORTS + 1_000);
        let mut rng = SysRng::new();

        let (wallet_id, _) = vault.allocate(&mut rng).await.unwrap();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let outcome = vault
            .sign_and_submit_transfer(wallet_id, &[(a, 600), (b, 600)])
            .await
            .unwrap();
        assert!(outcome.scaled);
        assert_eq!(outcome.amounts.iter().sum::<u64>(), 1_000);
    }

    #[tokio::test]
    async fn used_wallet_refuses_to_sign() {
        let vault = test_vault(10 * FEE_RESERVE_LAMPORTS);
        let mut rng = SysRng::new();
        let clock = FakeClock::new(TimestampMillis::now());

        let (wallet_id, _) = vault.allocate(&mut rng).await.unwrap();
        vault.mark_used(wallet_id, &clock).await.unwrap();

        let recipient = Pubkey::new_unique();
        let err = vault
            .sign_and_submit_single(wallet_id, &recipient, FEE_RESERVE_LAMPORTS)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::AlreadyUsed));
    }

    #[test]
    fn scale_to_callable_preserves_sum_exactly() {
        let (scaled, did_scale) = scale_to_callable(&[300, 300, 300], 450);
        assert!(did_scale);
        assert_eq!(scaled.iter().sum::<u64>(), 450);
    }

    #[test]
    fn scale_to_callable_is_noop_when_fits() {
        let (scaled, did_scale) = scale_to_callable(&[100, 200], 1_000);
        assert!(!did_scale);
        assert_eq!(scaled, vec![100, 200]);
    }
}
