//! `spec.md` §4.2: a monotonic global deposit counter, plus per-swap
//! recovery availability under two independent rules (community-scale
//! threshold, or a liveness timeout).
//!
//! `RecoveryLedger` is a thin handle around a [`LedgerStore`]; the storage
//! logic lives in `store.rs` so the Coordinator's end-to-end tests can run
//! against [`crate::test_utils::InMemoryLedgerStore`] instead of a live
//! Postgres instance.

use std::sync::Arc;

use relayer_core::clock::{Clock, TimestampMillis};
use relayer_core::constants::{RECOVERY_THRESHOLD, RECOVERY_TIMEOUT};
use relayer_core::ids::SwapId;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use subtle::ConstantTimeEq;

use crate::error::LedgerError;
use crate::store::{LedgerStore, PgLedgerStore};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AvailabilityReason {
    Threshold,
    Timeout,
    None,
}

#[derive(Debug, Clone)]
pub struct Availability {
    pub available: bool,
    pub reason: AvailabilityReason,
    pub details: String,
}

/// The Recovery Ledger. Owns the `deposit_counter` singleton row and the
/// `recovery_records` table; backed by the same Postgres pool as the Swap
/// Registry (`spec.md` §4.2).
pub struct RecoveryLedger {
    store: Arc<dyn LedgerStore>,
}

impl RecoveryLedger {
    pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
        let store = PgLedgerStore::connect(database_url).await?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            store: Arc::new(PgLedgerStore::from_pool(pool)),
        }
    }

    /// Builds a [`RecoveryLedger`] over an arbitrary [`LedgerStore`] — used
    /// by tests to inject an in-memory fake.
    pub fn from_store(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// SHA-256 of a recovery key, hex-encoded, as stored in
    /// `recovery_records.recovery_key_hash` and compared against in
    /// [`RecoveryLedger::verify_recovery_key`].
    pub fn hash_recovery_key(recovery_key: &str) -> String {
        let digest = Sha256::digest(recovery_key.as_bytes());
        hex::encode(digest)
    }

    /// Atomically increments the global deposit counter and returns the new
    /// total. One call per successful `initiate` (`spec.md` §3 invariant:
    /// "the DepositCounter is strictly monotonic").
    pub async fn increment(&self) -> Result<u64, LedgerError> {
        let total = self.store.increment_deposit_counter().await?;
        tracing::debug!(total_deposits = total, "deposit counter incremented");
        Ok(total)
    }

    /// Reads the current counter value without incrementing it.
    pub async fn current_count(&self) -> Result<u64, LedgerError> {
        self.store.current_deposit_count().await
    }

    /// Opens a recovery record for `transaction_id`, snapshotting
    /// `deposit_count_at_creation`. Idempotent: a second `open` for the same
    /// id is a no-op (`spec.md` §4.2 "idempotent on conflict"). Must be
    /// called after the swap row itself has been inserted by the Registry
    /// (the `transaction_id` foreign key requires it).
    pub async fn open(
        &self,
        transaction_id: SwapId,
        deposit_count_at_creation: u64,
        recovery_key_hash: &str,
    ) -> Result<(), LedgerError> {
        self.store
            .open_recovery_record(transaction_id, deposit_count_at_creation, recovery_key_hash)
            .await
    }

    /// Evaluates whether `transaction_id` is eligible for emergency
    /// recovery. Available iff `(counter_now - deposit_count_at_creation) >=
    /// RECOVERY_THRESHOLD`, or `(now - created_at) >= RECOVERY_TIMEOUT`
    /// while the swap is still `pending` — the two clauses are independent,
    /// either is sufficient (`spec.md` §4.2).
    ///
    /// Once `available = true` has been observed for a swap, every later
    /// call returns `available = true` again regardless of `swap_is_pending`
    /// (`spec.md` §8 property 5: "recovery availability is monotonic").
    pub async fn availability(
        &self,
        transaction_id: SwapId,
        swap_created_at: TimestampMillis,
        swap_is_pending: bool,
        clock: &dyn Clock,
    ) -> Result<Availability, LedgerError> {
        let record = self.store.get_recovery_record(transaction_id).await?;

        if record.recovery_available {
            let reason = match record.available_reason.as_deref() {
                Some("threshold") => AvailabilityReason::Threshold,
                Some("timeout") => AvailabilityReason::Timeout,
                _ => AvailabilityReason::None,
            };
            return Ok(Availability {
                available: true,
                reason,
                details: "previously evaluated available; monotonic".to_string(),
            });
        }

        let counter_now = self.current_count().await?;
        let deposits_since =
            counter_now.saturating_sub(record.deposit_count_at_creation);
        let threshold_met = deposits_since >= u64::from(RECOVERY_THRESHOLD);

        let age = clock.now().saturating_duration_since(swap_created_at);
        let timeout_met = swap_is_pending && age >= RECOVERY_TIMEOUT;

        let (available, reason, details) = if threshold_met {
            (
                true,
                AvailabilityReason::Threshold,
                format!(
                    "{deposits_since} deposits since creation (threshold {RECOVERY_THRESHOLD})"
                ),
            )
        } else if timeout_met {
            (
                true,
                AvailabilityReason::Timeout,
                format!("swap age {age:?} exceeds timeout {RECOVERY_TIMEOUT:?}"),
            )
        } else {
            (
                false,
                AvailabilityReason::None,
                format!(
                    "{deposits_since}/{RECOVERY_THRESHOLD} deposits, age {age:?} < {RECOVERY_TIMEOUT:?}"
                ),
            )
        };

        if available {
            let reason_str = match reason {
                AvailabilityReason::Threshold => "threshold",
                AvailabilityReason::Timeout => "timeout",
                AvailabilityReason::None => unreachable!(),
            };
            self.store.mark_available(transaction_id, reason_str).await?;
            tracing::info!(%transaction_id, reason = reason_str, "recovery became available");
        }

        Ok(Availability { available, reason, details })
    }

    /// Verifies `supplied_key` against the hash stored at `open` time, using
    /// a constant-time comparison (`spec.md` §4.2 `consume`). Does not check
    /// availability itself — the caller (Coordinator) must call
    /// [`RecoveryLedger::availability`] first and only invoke the on-chain
    /// transfer if it reports `available = true`.
    pub async fn verify_recovery_key(
        &self,
        transaction_id: SwapId,
        supplied_key: &str,
    ) -> Result<(), LedgerError> {
        let record = self.store.get_recovery_record(transaction_id).await?;

        let supplied_hash = Self::hash_recovery_key(supplied_key);
        let matches: bool = supplied_hash
            .as_bytes()
            .ct_eq(record.recovery_key_hash.as_bytes())
            .into();
        if matches {
            Ok(())
        } else {
            Err(LedgerError::InvalidRecoveryKey)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_recovery_key_is_deterministic_and_hex() {
        let hash = RecoveryLedger::hash_recovery_key("correct-horse-battery-staple");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, RecoveryLedger::hash_recovery_key("correct-horse-battery-staple"));
    }

    #[test]
    fn hash_recovery_key_differs_for_different_keys() {
        let a = RecoveryLedger::hash_recovery_key("key-a");
        let b = RecoveryLedger::hash_recovery_key("key-b");
        assert_ne!(a, b);
    }
}
