//! Storage seam for the Recovery Ledger (`spec.md` §4.2).
//!
//! A trait, not a concrete `PgPool` wrapper, so `relayer-coordinator`'s
//! end-to-end tests can drive the threshold/timeout recovery path against an
//! in-memory fake instead of a live Postgres instance — mirroring
//! `relayer-registry`'s `SwapStore` split.

use async_trait::async_trait;
use relayer_core::ids::SwapId;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::LedgerError;

/// A snapshot of a `recovery_records` row, storage-agnostic.
#[derive(Debug, Clone)]
pub struct RecoveryRecord {
    pub deposit_count_at_creation: u64,
    pub recovery_key_hash: String,
    pub recovery_available: bool,
    pub available_reason: Option<String>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Atomically increments the global deposit counter and returns the new
    /// total.
    async fn increment_deposit_counter(&self) -> Result<u64, LedgerError>;

    /// Reads the current counter value without incrementing it.
    async fn current_deposit_count(&self) -> Result<u64, LedgerError>;

    /// Idempotent insert of a recovery record.
    async fn open_recovery_record(
        &self,
        transaction_id: SwapId,
        deposit_count_at_creation: u64,
        recovery_key_hash: &str,
    ) -> Result<(), LedgerError>;

    async fn get_recovery_record(&self, transaction_id: SwapId) -> Result<RecoveryRecord, LedgerError>;

    /// Latches `recovery_available = true` with the given reason
    /// (`"threshold"` or `"timeout"`).
    async fn mark_available(&self, transaction_id: SwapId, reason: &str) -> Result<(), LedgerError>;
}

#[derive(FromRow)]
struct RecoveryRow {
    deposit_count_at_creation: i64,
    recovery_key_hash: String,
    recovery_available: bool,
    available_reason: Option<String>,
}

/// Postgres-backed [`LedgerStore`].
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn increment_deposit_counter(&self) -> Result<u64, LedgerError> {
        let row: (i64,) = sqlx::query_as(
            "UPDATE deposit_counter SET total_deposits = total_deposits + 1, \
             last_updated = now() WHERE name = 'main' RETURNING total_deposits",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 as u64)
    }

    async fn current_deposit_count(&self) -> Result<u64, LedgerError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT total_deposits FROM deposit_counter WHERE name = 'main'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 as u64)
    }

    async fn open_recovery_record(
        &self,
        transaction_id: SwapId,
        deposit_count_at_creation: u64,
        recovery_key_hash: &str,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO recovery_records \
             (transaction_id, deposit_count_at_creation, recovery_key_hash, recovery_available) \
             VALUES ($1, $2, $3, false) \
             ON CONFLICT (transaction_id) DO NOTHING",
        )
        .bind(transaction_id.as_uuid())
        .bind(deposit_count_at_creation as i64)
        .bind(recovery_key_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_recovery_record(&self, transaction_id: SwapId) -> Result<RecoveryRecord, LedgerError> {
        let row: RecoveryRow = sqlx::query_as(
            "SELECT deposit_count_at_creation, recovery_key_hash, recovery_available, \
             available_reason FROM recovery_records WHERE transaction_id = $1",
        )
        .bind(transaction_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::NotFound)?;

        Ok(RecoveryRecord {
            deposit_count_at_creation: row.deposit_count_at_creation as u64,
            recovery_key_hash: row.recovery_key_hash,
            recovery_available: row.recovery_available,
            available_reason: row.available_reason,
        })
    }

    async fn mark_available(&self, transaction_id: SwapId, reason: &str) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE recovery_records SET recovery_available = true, available_reason = $2 \
             WHERE transaction_id = $1",
        )
        .bind(transaction_id.as_uuid())
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
