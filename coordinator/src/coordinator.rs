//! The Mixing Coordinator (`spec.md` §4.4): the state machine that drives a
//! swap from `processing` through split, deposit, mixing-window dwell,
//! withdraw, merge, hop, and finalize, to `completed`.
//!
//! Grounded on the teacher's `Arc<Mutex<_>>` check/persist/commit shape in
//! `lexe-ln/src/payments/manager.rs`, generalized from a single payment
//! record to a swap's per-note wallet chain. Every step is persisted via
//! [`Registry::append_step`] immediately after RPC confirmation — never
//! before — so the last persisted step always identifies the funds'
//! current location (`spec.md` §4.4 "Every step").

use std::sync::Arc;

use relayer_chain::SolanaRpc;
use relayer_core::clock::Clock;
use relayer_core::constants::FEE_RESERVE_LAMPORTS;
use relayer_core::ids::SwapId;
use relayer_core::rng::Crng;
use relayer_ledger::RecoveryLedger;
use relayer_registry::{NewStep, Registry, Swap, SwapStatus};
use relayer_vault::{Vault, VaultError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::error::CoordinatorError;
use crate::strategy::StrategyProfile;
use crate::timing;
use crate::treasury::Treasury;
use crate::window::assign_window;

/// A wallet the Coordinator is currently routing funds through: the Vault's
/// opaque handle plus the public key needed to address it on chain.
#[derive(Clone, Copy, Debug)]
struct WalletHandle {
    id: relayer_core::ids::WalletId,
    pubkey: Pubkey,
}

pub struct MixingCoordinator<R: SolanaRpc> {
    vault: Arc<Vault<R>>,
    registry: Arc<Registry>,
    ledger: Arc<RecoveryLedger>,
    clock: Arc<dyn Clock>,
    profile: StrategyProfile,
    treasury: Option<Arc<Treasury<R>>>,
    fee_wallet_pubkey: Option<Pubkey>,
}

impl<R: SolanaRpc> MixingCoordinator<R> {
    pub fn new(
        vault: Arc<Vault<R>>,
        registry: Arc<Registry>,
        ledger: Arc<RecoveryLedger>,
        clock: Arc<dyn Clock>,
        profile: StrategyProfile,
        treasury: Option<Arc<Treasury<R>>>,
        fee_wallet_pubkey: Option<Pubkey>,
    ) -> Self {
        Self {
            vault,
            registry,
            ledger,
            clock,
            profile,
            treasury,
            fee_wallet_pubkey,
        }
    }

    /// Drives `transaction_id` through the full state machine. Assumes the
    /// caller (the Deposit Monitor's admitter) has already transitioned the
    /// swap `pending -> processing`. On any failure, persists the error and
    /// transitions to `failed` — never retries inside a swap (`spec.md`
    /// §4.4 "Failure policy").
    pub async fn run(
        &self,
        transaction_id: SwapId,
        rng: &mut impl Crng,
    ) -> Result<(), CoordinatorError> {
        tracing::info!(%transaction_id, "mixing coordinator starting swap");
        let swap = self.registry.get_swap(transaction_id).await?;
        match self.run_inner(&swap, rng).await {
            Ok(()) => {
                tracing::info!(%transaction_id, "mixing coordinator completed swap");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%transaction_id, error = %err, "mixing coordinator failed swap");
                let _ = self.registry.set_error(transaction_id, &err.to_string()).await;
                let _ = self
                    .registry
                    .transition_status(transaction_id, SwapStatus::Processing, SwapStatus::Failed)
                    .await;
                Err(err)
            }
        }
    }

    async fn run_inner(&self, swap: &Swap, rng: &mut impl Crng) -> Result<(), CoordinatorError> {
        let first = WalletHandle {
            id: swap.intermediate_wallet_id,
            pubkey: self.vault.pubkey_of(swap.intermediate_wallet_id).await?,
        };

        let notes = self.profile.build_split_plan(swap.amount_lamports, rng);
        tracing::debug!(transaction_id = %swap.transaction_id, note_count = notes.len(), "split plan built");

        let deposit_wallets = self.deposit_notes(swap, &first, &notes, rng).await?;
        self.vault.mark_used(first.id, self.clock.as_ref()).await?;

        self.sleep_mixing_delay(notes.len() as u32, rng).await;

        let withdraw_wallets = if self.profile.withdraw_enabled {
            self.withdraw_notes(swap, &deposit_wallets, &notes, rng).await?
        } else {
            deposit_wallets
        };

        let merged = self.merge_notes(swap, withdraw_wallets, rng).await?;
        let hopped = self.hop(swap, merged, rng).await?;
        self.finalize(swap, hopped, rng).await?;
        Ok(())
    }

    /// Primes a freshly allocated wallet's fee/rent reserve from `funder`,
    /// falling back to the optional treasury if `funder`'s payable balance
    /// can't cover it (`spec.md` §4.4 step 2, §9 "Treasury as optional
    /// capability").
    async fn prime_wallet(
        &self,
        funder: &WalletHandle,
        target_pubkey: &Pubkey,
    ) -> Result<(), CoordinatorError> {
        let balance = self.vault.balance(&funder.pubkey).await?;
        let payable = self.vault.payable_balance(balance);
        if payable >= FEE_RESERVE_LAMPORTS {
            self.vault
                .sign_and_submit_single(funder.id, target_pubkey, FEE_RESERVE_LAMPORTS)
                .await?;
            return Ok(());
        }
        match &self.treasury {
            Some(treasury) => treasury
                .fund(target_pubkey, FEE_RESERVE_LAMPORTS)
                .await
                .map_err(|_| CoordinatorError::CannotPrime),
            None => Err(CoordinatorError::CannotPrime),
        }
    }

    /// Step 1-4: allocate one deposit wallet per note, prime it, transfer
    /// the note's value from the first intermediate, record a step and a
    /// mixing-window contribution, with a randomized delay between notes.
    async fn deposit_notes(
        &self,
        swap: &Swap,
        first: &WalletHandle,
        notes: &[u64],
        rng: &mut impl Crng,
    ) -> Result<Vec<WalletHandle>, CoordinatorError> {
        let mut wallets = Vec::with_capacity(notes.len());
        for (index, &value) in notes.iter().enumerate() {
            let (id, pubkey) = self.vault.allocate(rng).await?;
            self.prime_wallet(first, &pubkey).await?;
            let outcome = self.vault.sign_and_submit_single(first.id, &pubkey, value).await?;
            self.record_step(
                swap.transaction_id,
                &first.pubkey,
                &pubkey,
                outcome.signature,
                Some(outcome.amounts[0]),
            )
            .await?;

            let window = assign_window(self.clock.now());
            self.registry
                .upsert_window(&window.window_id, window.start, window.end, outcome.amounts[0])
                .await?;

            wallets.push(WalletHandle { id, pubkey });
            if index + 1 < notes.len() {
                tokio::time::sleep(timing::deposit_delay(rng)).await;
            }
        }
        Ok(wallets)
    }

    /// Step 4 tail + step 5: the mixing-delay dwell. Implements the
    /// specified doubling intentionally (`spec.md` §9 / `DESIGN.md`).
    async fn sleep_mixing_delay(&self, tx_count: u32, rng: &mut impl Crng) {
        let base = timing::mixing_delay_base(rng, tx_count);
        tokio::time::sleep(base).await;
        let extra = timing::mixing_delay_extra(rng, base);
        tokio::time::sleep(extra).await;
    }

    /// Step 5: allocate a withdraw wallet per note, prime from its deposit
    /// wallet, apply obfuscation jitter, transfer, mark the deposit wallet
    /// used.
    async fn withdraw_notes(
        &self,
        swap: &Swap,
        deposit_wallets: &[WalletHandle],
        notes: &[u64],
        rng: &mut impl Crng,
    ) -> Result<Vec<WalletHandle>, CoordinatorError> {
        let mut wallets = Vec::with_capacity(deposit_wallets.len());
        for (deposit, &value) in deposit_wallets.iter().zip(notes.iter()) {
            let (id, pubkey) = self.vault.allocate(rng).await?;
            self.prime_wallet(deposit, &pubkey).await?;

            let obfuscated =
                timing::obfuscate_amount_with_range(rng, value, self.profile.obfuscation_range_lamports);
            tokio::time::sleep(timing::withdraw_delay(rng)).await;

            let outcome = self
                .vault
                .sign_and_submit_single(deposit.id, &pubkey, obfuscated)
                .await?;
            self.record_step(
                swap.transaction_id,
                &deposit.pubkey,
                &pubkey,
                outcome.signature,
                Some(outcome.amounts[0]),
            )
            .await?;
            self.vault.mark_used(deposit.id, self.clock.as_ref()).await?;

            wallets.push(WalletHandle { id, pubkey });
        }
        Ok(wallets)
    }

    /// Step 6: if more than one note, merge every note wallet's payable
    /// balance into a single freshly allocated merge wallet. A single note
    /// skips straight through (`M = W_0`).
    async fn merge_notes(
        &self,
        swap: &Swap,
        note_wallets: Vec<WalletHandle>,
        rng: &mut impl Crng,
    ) -> Result<WalletHandle, CoordinatorError> {
        if note_wallets.len() == 1 {
            return Ok(note_wallets[0]);
        }

        let (merge_id, merge_pubkey) = self.vault.allocate(rng).await?;
        let merge = WalletHandle { id: merge_id, pubkey: merge_pubkey };
        self.prime_wallet(&note_wallets[0], &merge.pubkey).await?;

        for note in &note_wallets {
            let balance = self.vault.balance(&note.pubkey).await?;
            let payable = self.vault.payable_balance(balance);
            tokio::time::sleep(timing::merge_delay(rng)).await;

            let outcome = self
                .vault
                .sign_and_submit_single(note.id, &merge.pubkey, payable)
                .await?;
            self.record_step(
                swap.transaction_id,
                &note.pubkey,
                &merge.pubkey,
                outcome.signature,
                Some(outcome.amounts[0]),
            )
            .await?;
            self.vault.mark_used(note.id, self.clock.as_ref()).await?;
        }

        Ok(merge)
    }

    /// Step 7: 1-2 hops through freshly allocated wallets, each moving the
    /// full payable balance of the current wallet.
    async fn hop(
        &self,
        swap: &Swap,
        merged: WalletHandle,
        rng: &mut impl Crng,
    ) -> Result<WalletHandle, CoordinatorError> {
        let hop_count = timing::sample_hop_count(rng, self.profile.hop_range);
        let mut current = merged;
        for _ in 0..hop_count {
            let (id, pubkey) = self.vault.allocate(rng).await?;
            let next = WalletHandle { id, pubkey };
            self.prime_wallet(&current, &next.pubkey).await?;
            tokio::time::sleep(timing::hop_delay(rng)).await;

            let balance = self.vault.balance(&current.pubkey).await?;
            let payable = self.vault.payable_balance(balance);
            let outcome = self
                .vault
                .sign_and_submit_single(current.id, &next.pubkey, payable)
                .await?;
            self.record_step(
                swap.transaction_id,
                &current.pubkey,
                &next.pubkey,
                outcome.signature,
                Some(outcome.amounts[0]),
            )
            .await?;
            self.vault.mark_used(current.id, self.clock.as_ref()).await?;
            current = next;
        }
        Ok(current)
    }

    /// Step 8-9: finalize to the destination (plus fee wallet, if
    /// configured), persist the final signature, and complete the swap.
    async fn finalize(
        &self,
        swap: &Swap,
        current: WalletHandle,
        rng: &mut impl Crng,
    ) -> Result<(), CoordinatorError> {
        tokio::time::sleep(timing::finalize_delay(rng)).await;

        let dest: Pubkey = swap
            .dest_addr
            .parse()
            .map_err(|_| CoordinatorError::InvalidAddress(swap.dest_addr.clone()))?;
        let balance = self.vault.balance(&current.pubkey).await?;
        let payable = self.vault.payable_balance(balance);

        let recipients =
            finalize_recipients(dest, self.fee_wallet_pubkey, payable, swap.relayer_fee_lamports);
        let outcome = self
            .vault
            .sign_and_submit_transfer(current.id, &recipients)
            .await?;

        self.record_step(
            swap.transaction_id,
            &current.pubkey,
            &dest,
            outcome.signature,
            outcome.amounts.first().copied(),
        )
        .await?;
        self.vault.mark_used(current.id, self.clock.as_ref()).await?;

        self.registry
            .set_final_sig(swap.transaction_id, &outcome.signature.to_string())
            .await?;
        self.registry
            .transition_status(swap.transaction_id, SwapStatus::Processing, SwapStatus::Completed)
            .await?;
        tracing::info!(
            transaction_id = %swap.transaction_id,
            signature = %outcome.signature,
            "swap finalized to destination"
        );
        Ok(())
    }

    async fn record_step(
        &self,
        transaction_id: SwapId,
        from: &Pubkey,
        to: &Pubkey,
        signature: Signature,
        amount_lamports: Option<u64>,
    ) -> Result<(), CoordinatorError> {
        self.registry
            .append_step(
                transaction_id,
                NewStep {
                    from_addr: from.to_string(),
                    to_addr: to.to_string(),
                    tx_sig: signature.to_string(),
                    amount_lamports,
                },
            )
            .await?;
        Ok(())
    }

    /// Emergency direct withdrawal (`spec.md` §4.2, §4.4): valid only while
    /// a swap is still `pending` and its first intermediate still holds the
    /// deposited balance (enforcing `processing -> recovered` is forbidden
    /// without relying on a race-prone status check alone).
    pub async fn recover(
        &self,
        transaction_id: SwapId,
        recovery_key: &str,
        destination: &Pubkey,
    ) -> Result<Signature, CoordinatorError> {
        let swap = self.registry.get_swap(transaction_id).await?;

        let availability = self
            .ledger
            .availability(
                transaction_id,
                swap.created_at,
                swap.status == SwapStatus::Pending,
                self.clock.as_ref(),
            )
            .await?;
        if !availability.available {
            tracing::debug!(%transaction_id, details = %availability.details, "recovery attempt rejected, not yet available");
            return Err(CoordinatorError::RecoveryNotAvailable { details: availability.details });
        }

        self.ledger
            .verify_recovery_key(transaction_id, recovery_key)
            .await
            .map_err(CoordinatorError::from_recovery_ledger)?;

        let intermediate_pubkey = self.vault.pubkey_of(swap.intermediate_wallet_id).await?;
        let balance = self.vault.balance(&intermediate_pubkey).await?;
        if !funds_untouched(balance, swap.amount_lamports) {
            tracing::warn!(%transaction_id, "recovery attempt rejected, funds already moving");
            return Err(CoordinatorError::FundsAlreadyMoving);
        }

        let payable = self.vault.payable_balance(balance);
        let recipients = finalize_recipients(
            *destination,
            self.fee_wallet_pubkey,
            payable,
            swap.relayer_fee_lamports,
        );
        let outcome = self
            .vault
            .sign_and_submit_transfer(swap.intermediate_wallet_id, &recipients)
            .await?;

        self.record_step(
            transaction_id,
            &intermediate_pubkey,
            destination,
            outcome.signature,
            outcome.amounts.first().copied(),
        )
        .await?;
        self.vault.mark_used(swap.intermediate_wallet_id, self.clock.as_ref()).await?;

        self.registry
            .set_final_sig(transaction_id, &outcome.signature.to_string())
            .await?;
        self.registry
            .transition_status(transaction_id, SwapStatus::Pending, SwapStatus::Recovered)
            .await?;
        tracing::info!(%transaction_id, signature = %outcome.signature, "swap recovered to destination");

        Ok(outcome.signature)
    }
}

/// Whether the first intermediate still holds (at least) the deposited
/// amount — the gate that makes `processing -> recovered` unreachable
/// (`spec.md` §3 invariants): once funds have moved on, the balance drops
/// below the deposited amount and recovery refuses.
fn funds_untouched(current_balance: u64, deposited_amount: u64) -> bool {
    current_balance >= deposited_amount
}

/// The finalize/recovery payout split (`spec.md` §4.4 step 8): two
/// recipients if a relayer-fee wallet is configured, otherwise the full
/// payable balance to `dest` alone. Pure and RPC-free so it's exhaustively
/// unit tested without any fakes.
fn finalize_recipients(
    dest: Pubkey,
    fee_wallet: Option<Pubkey>,
    payable_balance: u64,
    relayer_fee_lamports: u64,
) -> Vec<(Pubkey, u64)> {
    match fee_wallet {
        Some(fee_pubkey) => {
            let net = payable_balance.saturating_sub(relayer_fee_lamports);
            vec![(dest, net), (fee_pubkey, relayer_fee_lamports)]
        }
        None => vec![(dest, payable_balance)],
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use relayer_chain::test_utils::FakeRpc;
    use relayer_core::clock::test_utils::FakeClock;
    use relayer_core::clock::TimestampMillis;
    use relayer_core::constants::{OBFUSCATION_RANGE_LAMPORTS, RECOVERY_THRESHOLD, RECOVERY_TIMEOUT};
    use relayer_core::ids::SwapId;
    use relayer_core::rng::SysRng;
    use relayer_ledger::test_utils::InMemoryLedgerStore;
    use relayer_ledger::AvailabilityReason;
    use relayer_registry::test_utils::InMemorySwapStore;
    use relayer_registry::NewSwap;
    use relayer_vault::aead::MasterKey;
    use relayer_vault::test_utils::InMemoryWalletStore;
    use relayer_vault::WalletStore;

    use crate::fee::compute_relayer_fee_lamports;

    use super::*;

    fn test_vault(rpc: Arc<FakeRpc>) -> Vault<FakeRpc> {
        let master_key = MasterKey::from_bytes(&[9u8; 32]).unwrap();
        let store: Arc<dyn WalletStore> = Arc::new(InMemoryWalletStore::default());
        Vault::new(master_key, rpc, store)
    }

    #[test]
    fn finalize_recipients_splits_with_fee_wallet() {
        let dest = Pubkey::new_unique();
        let fee_wallet = Pubkey::new_unique();
        let recipients = finalize_recipients(dest, Some(fee_wallet), 1_000_000, 5_000);
        assert_eq!(recipients, vec![(dest, 995_000), (fee_wallet, 5_000)]);
    }

    #[test]
    fn finalize_recipients_single_when_no_fee_wallet() {
        let dest = Pubkey::new_unique();
        let recipients = finalize_recipients(dest, None, 1_000_000, 5_000);
        assert_eq!(recipients, vec![(dest, 1_000_000)]);
    }

    #[test]
    fn finalize_recipients_saturates_when_fee_exceeds_balance() {
        let dest = Pubkey::new_unique();
        let fee_wallet = Pubkey::new_unique();
        let recipients = finalize_recipients(dest, Some(fee_wallet), 1_000, 5_000);
        assert_eq!(recipients, vec![(dest, 0), (fee_wallet, 5_000)]);
    }

    #[test]
    fn funds_untouched_true_when_balance_covers_deposit() {
        assert!(funds_untouched(1_000_000, 1_000_000));
        assert!(funds_untouched(2_000_000, 1_000_000));
    }

    #[test]
    fn funds_untouched_false_once_balance_drops() {
        assert!(!funds_untouched(999_999, 1_000_000));
    }

    #[tokio::test]
    async fn prime_wallet_uses_funder_when_funded() {
        let rpc = Arc::new(FakeRpc::new(10 * FEE_RESERVE_LAMPORTS));
        let vault = Arc::new(test_vault(rpc.clone()));
        let registry = Arc::new(Registry::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let ledger = Arc::new(RecoveryLedger::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let clock = Arc::new(FakeClock::new(TimestampMillis::now()));
        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry,
            ledger,
            clock,
            StrategyProfile::standard(),
            None,
            None,
        );

        let mut rng = SysRng::new();
        let (funder_id, funder_pubkey) = vault.allocate(&mut rng).await.unwrap();
        let target = Pubkey::new_unique();

        coordinator
            .prime_wallet(&WalletHandle { id: funder_id, pubkey: funder_pubkey }, &target)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn prime_wallet_fails_without_treasury_when_funder_underfunded() {
        let rpc = Arc::new(FakeRpc::new(FEE_RESERVE_LAMPORTS / 2));
        let vault = Arc::new(test_vault(rpc.clone()));
        let registry = Arc::new(Registry::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let ledger = Arc::new(RecoveryLedger::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let clock = Arc::new(FakeClock::new(TimestampMillis::now()));
        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry,
            ledger,
            clock,
            StrategyProfile::standard(),
            None,
            None,
        );

        let mut rng = SysRng::new();
        let (funder_id, funder_pubkey) = vault.allocate(&mut rng).await.unwrap();
        let target = Pubkey::new_unique();

        let err = coordinator
            .prime_wallet(&WalletHandle { id: funder_id, pubkey: funder_pubkey }, &target)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::CannotPrime));
    }

    #[tokio::test]
    async fn prime_wallet_falls_back_to_treasury_when_funder_underfunded() {
        let rpc = Arc::new(FakeRpc::new(FEE_RESERVE_LAMPORTS / 2));
        let vault = Arc::new(test_vault(rpc.clone()));
        let registry = Arc::new(Registry::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let ledger = Arc::new(RecoveryLedger::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let clock = Arc::new(FakeClock::new(TimestampMillis::now()));
        let treasury = Arc::new(Treasury::new(
            solana_sdk::signature::Keypair::new(),
            rpc.clone(),
        ));
        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry,
            ledger,
            clock,
            StrategyProfile::standard(),
            Some(treasury),
            None,
        );

        let mut rng = SysRng::new();
        let (funder_id, funder_pubkey) = vault.allocate(&mut rng).await.unwrap();
        let target = Pubkey::new_unique();

        coordinator
            .prime_wallet(&WalletHandle { id: funder_id, pubkey: funder_pubkey }, &target)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn prime_wallet_surfaces_vault_error_when_wallet_already_used() {
        let rpc = Arc::new(FakeRpc::new(10 * FEE_RESERVE_LAMPORTS));
        let vault = Arc::new(test_vault(rpc.clone()));
        let registry = Arc::new(Registry::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let ledger = Arc::new(RecoveryLedger::from_pool(
            sqlx::Pool::connect_lazy("postgres://unused/unused").unwrap(),
        ));
        let clock = Arc::new(FakeClock::new(TimestampMillis::now()));
        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry,
            ledger,
            clock.clone(),
            StrategyProfile::standard(),
            None,
            None,
        );

        let mut rng = SysRng::new();
        let (funder_id, funder_pubkey) = vault.allocate(&mut rng).await.unwrap();
        vault.mark_used(funder_id, clock.as_ref()).await.unwrap();
        let target = Pubkey::new_unique();

        let err = coordinator
            .prime_wallet(&WalletHandle { id: funder_id, pubkey: funder_pubkey }, &target)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Vault(VaultError::AlreadyUsed)));
    }

    /// In-memory Registry/Ledger pair, sharing storage the same way a real
    /// Postgres pool would across both crates (`spec.md` §8 scenario tests).
    fn test_registry_and_ledger() -> (Arc<Registry>, Arc<RecoveryLedger>) {
        let registry = Arc::new(Registry::from_store(Arc::new(InMemorySwapStore::new())));
        let ledger = Arc::new(RecoveryLedger::from_store(Arc::new(InMemoryLedgerStore::new())));
        (registry, ledger)
    }

    /// Inserts a `pending` swap and, unless `leave_pending` is set, advances
    /// it to `processing` the way the Deposit Monitor's admitter does before
    /// handing a swap to `MixingCoordinator::run`.
    async fn seed_swap(
        registry: &Registry,
        intermediate_wallet_id: relayer_core::ids::WalletId,
        dest: Pubkey,
        amount_lamports: u64,
        rng: &mut SysRng,
        leave_pending: bool,
    ) -> SwapId {
        let transaction_id = SwapId::new(rng);
        registry
            .create_swap(NewSwap {
                transaction_id,
                source_addr: Pubkey::new_unique().to_string(),
                dest_addr: dest.to_string(),
                amount_lamports,
                intermediate_wallet_id,
                source_sig: Signature::default().to_string(),
                relayer_fee_lamports: compute_relayer_fee_lamports(amount_lamports),
                config_hash: "test-config".to_string(),
            })
            .await
            .unwrap();
        if !leave_pending {
            registry
                .transition_status(transaction_id, SwapStatus::Pending, SwapStatus::Processing)
                .await
                .unwrap();
        }
        transaction_id
    }

    /// Scenario 1 (`spec.md` §8, happy path, small amount): a 0.05 SOL swap
    /// takes the deterministic 2-note split plan end to end and lands at the
    /// destination within the documented obfuscation/reserve slack.
    #[tokio::test(start_paused = true)]
    async fn end_to_end_happy_path_small_reaches_destination() {
        const AMOUNT: u64 = 50_000_000; // 0.05 SOL -> choose_note_count == 2
        const NOTES: u64 = 2;

        let rpc = Arc::new(FakeRpc::new(0));
        let vault = Arc::new(test_vault(rpc.clone()));
        let (registry, ledger) = test_registry_and_ledger();
        let clock = Arc::new(FakeClock::new(TimestampMillis::from_millis(0)));

        let mut rng = SysRng::new();
        let (first_id, first_pubkey) = vault.allocate(&mut rng).await.unwrap();
        rpc.set_balance(first_pubkey, AMOUNT + 20 * FEE_RESERVE_LAMPORTS);

        let dest = Pubkey::new_unique();
        let fee_wallet = Pubkey::new_unique();
        let fee = compute_relayer_fee_lamports(AMOUNT);
        let transaction_id =
            seed_swap(&registry, first_id, dest, AMOUNT, &mut rng, false).await;

        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry.clone(),
            ledger,
            clock,
            StrategyProfile::standard(),
            None,
            Some(fee_wallet),
        );
        coordinator.run(transaction_id, &mut rng).await.unwrap();

        let swap = registry.get_swap(transaction_id).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Completed);
        assert!(swap.final_sig.is_some());
        // deposit(N) + withdraw(N) + merge(N) + hop(1|2) + finalize(1)
        let expected_steps = [3 * NOTES + 1 + 1, 3 * NOTES + 2 + 1];
        assert!(
            expected_steps.contains(&(swap.steps.len() as u64)),
            "expected {:?} steps, got {}",
            expected_steps,
            swap.steps.len()
        );

        let dest_balance = rpc.get_balance(&dest).await.unwrap();
        let expected_net = AMOUNT.saturating_sub(fee);
        // Each note picks up independent obfuscation jitter at withdraw, and
        // every intermediate wallet along the way leaves FEE_RESERVE_LAMPORTS
        // behind rather than forwarding it (`spec.md` §4.4, §9 rent reserve).
        let slack = NOTES * (OBFUSCATION_RANGE_LAMPORTS + 4 * FEE_RESERVE_LAMPORTS);
        let lower = expected_net.saturating_sub(slack);
        let upper = expected_net + slack;
        assert!(
            dest_balance >= lower && dest_balance <= upper,
            "destination balance {dest_balance} outside [{lower}, {upper}]"
        );
    }

    /// Scenario 2 (`spec.md` §8, happy path, large amount): a 2.5 SOL swap
    /// takes the deterministic 8-note split plan, reproducing the cited
    /// 26/27-step pipeline.
    #[tokio::test(start_paused = true)]
    async fn end_to_end_happy_path_large_uses_eight_notes() {
        const AMOUNT: u64 = 2_500_000_000; // 2.5 SOL -> choose_note_count == 8
        const NOTES: u64 = 8;

        let rpc = Arc::new(FakeRpc::new(0));
        let vault = Arc::new(test_vault(rpc.clone()));
        let (registry, ledger) = test_registry_and_ledger();
        let clock = Arc::new(FakeClock::new(TimestampMillis::from_millis(0)));

        let mut rng = SysRng::new();
        let (first_id, first_pubkey) = vault.allocate(&mut rng).await.unwrap();
        rpc.set_balance(first_pubkey, AMOUNT + 20 * FEE_RESERVE_LAMPORTS);

        let dest = Pubkey::new_unique();
        let fee_wallet = Pubkey::new_unique();
        let fee = compute_relayer_fee_lamports(AMOUNT);
        let transaction_id =
            seed_swap(&registry, first_id, dest, AMOUNT, &mut rng, false).await;

        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry.clone(),
            ledger,
            clock,
            StrategyProfile::standard(),
            None,
            Some(fee_wallet),
        );
        coordinator.run(transaction_id, &mut rng).await.unwrap();

        let swap = registry.get_swap(transaction_id).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Completed);
        assert!(
            swap.steps.len() == 26 || swap.steps.len() == 27,
            "expected 26 or 27 steps for 8 notes, got {}",
            swap.steps.len()
        );

        let dest_balance = rpc.get_balance(&dest).await.unwrap();
        let expected_net = AMOUNT.saturating_sub(fee);
        let slack = NOTES * (OBFUSCATION_RANGE_LAMPORTS + 4 * FEE_RESERVE_LAMPORTS);
        let lower = expected_net.saturating_sub(slack);
        let upper = expected_net + slack;
        assert!(
            dest_balance >= lower && dest_balance <= upper,
            "destination balance {dest_balance} outside [{lower}, {upper}]"
        );
    }

    /// Scenario 3 (`spec.md` §8, recovery via threshold): a swap stuck
    /// `pending` becomes recoverable once enough *other* deposits have
    /// landed, independent of how long it's been waiting.
    #[tokio::test(start_paused = true)]
    async fn end_to_end_recovery_via_threshold() {
        const AMOUNT: u64 = 100_000_000;

        let rpc = Arc::new(FakeRpc::new(0));
        let vault = Arc::new(test_vault(rpc.clone()));
        let (registry, ledger) = test_registry_and_ledger();
        let clock = Arc::new(FakeClock::new(TimestampMillis::from_millis(0)));

        let mut rng = SysRng::new();
        let (first_id, first_pubkey) = vault.allocate(&mut rng).await.unwrap();
        rpc.set_balance(first_pubkey, AMOUNT); // deposit landed, untouched since

        let dest = Pubkey::new_unique();
        let fee_wallet = Pubkey::new_unique();
        let transaction_id =
            seed_swap(&registry, first_id, dest, AMOUNT, &mut rng, true).await;

        let recovery_key = "correct-horse-battery-staple";
        let key_hash = RecoveryLedger::hash_recovery_key(recovery_key);
        ledger.open(transaction_id, 0, &key_hash).await.unwrap();
        for _ in 0..RECOVERY_THRESHOLD {
            ledger.increment().await.unwrap();
        }

        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry.clone(),
            ledger,
            clock,
            StrategyProfile::standard(),
            None,
            Some(fee_wallet),
        );
        coordinator.recover(transaction_id, recovery_key, &dest).await.unwrap();

        let swap = registry.get_swap(transaction_id).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Recovered);
        assert!(swap.final_sig.is_some());

        // No split/withdraw jitter on the recovery path: the payout is exact,
        // net of the relayer fee now that a fee wallet is configured.
        let expected = vault.payable_balance(AMOUNT).saturating_sub(swap.relayer_fee_lamports);
        assert_eq!(rpc.get_balance(&dest).await.unwrap(), expected);
        assert_eq!(rpc.get_balance(&fee_wallet).await.unwrap(), swap.relayer_fee_lamports);
    }

    /// Scenario 4 (`spec.md` §8, recovery via timeout): a swap with no
    /// qualifying threshold becomes recoverable purely from having sat
    /// `pending` past `RECOVERY_TIMEOUT` — the deposit-never-arrives case,
    /// where the user's transfer never reached the intermediate wallet and
    /// there is nothing left for the Monitor to admit.
    #[tokio::test(start_paused = true)]
    async fn end_to_end_recovery_via_timeout_when_deposit_never_arrives() {
        const AMOUNT: u64 = 100_000_000;

        let rpc = Arc::new(FakeRpc::new(0));
        let vault = Arc::new(test_vault(rpc.clone()));
        let (registry, ledger) = test_registry_and_ledger();
        let clock = Arc::new(FakeClock::new(TimestampMillis::from_millis(0)));

        let mut rng = SysRng::new();
        let (first_id, _first_pubkey) = vault.allocate(&mut rng).await.unwrap();
        // The intermediate wallet never receives the user's deposit: its
        // balance stays at the FakeRpc default of 0 for the whole test.

        let dest = Pubkey::new_unique();
        let transaction_id =
            seed_swap(&registry, first_id, dest, AMOUNT, &mut rng, true).await;

        let recovery_key = "never-arrived";
        let key_hash = RecoveryLedger::hash_recovery_key(recovery_key);
        ledger.open(transaction_id, 0, &key_hash).await.unwrap();
        clock.advance(RECOVERY_TIMEOUT + Duration::from_millis(1));

        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry.clone(),
            ledger.clone(),
            clock.clone(),
            StrategyProfile::standard(),
            None,
            None,
        );

        // Recovery is offered (the timeout fired), but there is nothing to
        // recover: the balance check refuses rather than paying out funds
        // that were never actually deposited.
        let availability = ledger
            .availability(transaction_id, TimestampMillis::from_millis(0), true, clock.as_ref())
            .await
            .unwrap();
        assert!(availability.available);
        assert_eq!(availability.reason, AvailabilityReason::Timeout);

        let err = coordinator
            .recover(transaction_id, recovery_key, &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::FundsAlreadyMoving));

        let swap = registry.get_swap(transaction_id).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Pending);
    }

    /// Scenario 5 (`spec.md` §8, insufficient reserve): with no treasury
    /// configured, a first intermediate wallet holding only the bare
    /// deposited amount (no margin above `FEE_RESERVE_LAMPORTS`) can't prime
    /// even its first deposit wallet, so the whole swap fails closed.
    #[tokio::test(start_paused = true)]
    async fn end_to_end_fails_closed_on_insufficient_reserve() {
        const AMOUNT: u64 = FEE_RESERVE_LAMPORTS / 2;

        let rpc = Arc::new(FakeRpc::new(0));
        let vault = Arc::new(test_vault(rpc.clone()));
        let (registry, ledger) = test_registry_and_ledger();
        let clock = Arc::new(FakeClock::new(TimestampMillis::from_millis(0)));

        let mut rng = SysRng::new();
        let (first_id, first_pubkey) = vault.allocate(&mut rng).await.unwrap();
        rpc.set_balance(first_pubkey, AMOUNT); // exactly the deposit, no reserve margin

        let dest = Pubkey::new_unique();
        let transaction_id =
            seed_swap(&registry, first_id, dest, AMOUNT, &mut rng, false).await;

        let coordinator = MixingCoordinator::new(
            vault.clone(),
            registry.clone(),
            ledger,
            clock,
            StrategyProfile::standard(),
            None,
            None,
        );
        let err = coordinator.run(transaction_id, &mut rng).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::CannotPrime));

        let swap = registry.get_swap(transaction_id).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Failed);
        assert!(swap.error.is_some());
    }
}
