//! Storage seam for the Swap Registry (`spec.md` §4.5).
//!
//! A trait, not a concrete `PgPool` wrapper, so `relayer-coordinator`'s
//! end-to-end tests can run the full state machine against an in-memory
//! fake instead of a live Postgres instance — mirroring `relayer-vault`'s
//! `WalletStore`/`InMemoryWalletStore`/`PgWalletStore` split.
//!
//! Runtime-checked `sqlx::query`/`query_as` are used in place of the
//! `query!`/`query_as!` macros, which need a live database or a committed
//! `.sqlx` offline cache at compile time; see `DESIGN.md`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relayer_core::clock::TimestampMillis;
use relayer_core::ids::{MemoId, SwapId, WalletId};
use relayer_core::money::{decimal_to_lamports, lamports_to_decimal};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::RegistryError;
use crate::types::{
    EncryptedMemo, MixingWindow, NewMemo, NewStep, NewSwap, Swap, SwapStatus, SwapStep,
};

pub(crate) fn to_chrono(ts: TimestampMillis) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.as_i64())
        .expect("TimestampMillis always fits in a chrono DateTime")
}

pub(crate) fn from_chrono(dt: DateTime<Utc>) -> TimestampMillis {
    TimestampMillis::from_millis(dt.timestamp_millis())
}

/// Persistence for swap rows, their steps, mixing windows, and memos. Every
/// Coordinator write goes through an implementation of this trait
/// (`spec.md` §4.5: "the Coordinator holds no cache").
#[async_trait]
pub trait SwapStore: Send + Sync {
    async fn create_swap(&self, new_swap: NewSwap) -> Result<(), RegistryError>;

    async fn append_step(&self, transaction_id: SwapId, step: NewStep) -> Result<i32, RegistryError>;

    async fn transition_status(
        &self,
        transaction_id: SwapId,
        from: SwapStatus,
        to: SwapStatus,
    ) -> Result<(), RegistryError>;

    async fn set_error(&self, transaction_id: SwapId, message: &str) -> Result<(), RegistryError>;

    async fn set_final_sig(&self, transaction_id: SwapId, final_sig: &str) -> Result<(), RegistryError>;

    async fn upsert_window(
        &self,
        window_id: &str,
        start: TimestampMillis,
        end: TimestampMillis,
        amount_lamports: u64,
    ) -> Result<(), RegistryError>;

    async fn get_window(&self, window_id: &str) -> Result<Option<MixingWindow>, RegistryError>;

    async fn store_memo(&self, memo: NewMemo) -> Result<(), RegistryError>;

    async fn get_memo(&self, transaction_id: SwapId) -> Result<EncryptedMemo, RegistryError>;

    async fn get_swap(&self, transaction_id: SwapId) -> Result<Swap, RegistryError>;

    async fn oldest_pending(&self, limit: i64) -> Result<Vec<Swap>, RegistryError>;
}

#[derive(FromRow)]
struct SwapRow {
    transaction_id: uuid::Uuid,
    source_addr: String,
    dest_addr: String,
    amount: Decimal,
    intermediate_wallet_id: uuid::Uuid,
    source_sig: String,
    status: String,
    relayer_fee: Decimal,
    final_sig: Option<String>,
    config_hash: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

#[derive(FromRow)]
struct StepRow {
    transaction_id: uuid::Uuid,
    step_index: i32,
    from_addr: String,
    to_addr: String,
    tx_sig: String,
    amount: Option<Decimal>,
    recorded_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MemoRow {
    memo_id: uuid::Uuid,
    transaction_id: uuid::Uuid,
    ciphertext: Vec<u8>,
    metadata: serde_json::Value,
}

/// Postgres-backed [`SwapStore`].
pub struct PgSwapStore {
    pool: PgPool,
}

impl PgSwapStore {
    pub async fn connect(database_url: &str) -> Result<Self, RegistryError> {
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
impl SwapStore for PgSwapStore {
    async fn create_swap(&self, new_swap: NewSwap) -> Result<(), RegistryError> {
        sqlx::query(
            "INSERT INTO swaps \
             (transaction_id, source_addr, dest_addr, amount, intermediate_wallet_id, \
              source_sig, status, relayer_fee, config_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)",
        )
        .bind(new_swap.transaction_id.as_uuid())
        .bind(&new_swap.source_addr)
        .bind(&new_swap.dest_addr)
        .bind(lamports_to_decimal(new_swap.amount_lamports))
        .bind(new_swap.intermediate_wallet_id.as_uuid())
        .bind(&new_swap.source_sig)
        .bind(lamports_to_decimal(new_swap.relayer_fee_lamports))
        .bind(&new_swap.config_hash)
        .execute(&self.pool)
        .await?;
        tracing::info!(transaction_id = %new_swap.transaction_id, "swap created");
        Ok(())
    }

    async fn append_step(&self, transaction_id: SwapId, step: NewStep) -> Result<i32, RegistryError> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO swap_steps (transaction_id, step_index, from_addr, to_addr, tx_sig, amount) \
             SELECT $1, COALESCE(MAX(step_index), -1) + 1, $2, $3, $4, $5 \
             FROM swap_steps WHERE transaction_id = $1 \
             RETURNING step_index",
        )
        .bind(transaction_id.as_uuid())
        .bind(&step.from_addr)
        .bind(&step.to_addr)
        .bind(&step.tx_sig)
        .bind(step.amount_lamports.map(lamports_to_decimal))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn transition_status(
        &self,
        transaction_id: SwapId,
        from: SwapStatus,
        to: SwapStatus,
    ) -> Result<(), RegistryError> {
        let result = sqlx::query(
            "UPDATE swaps SET status = $3 WHERE transaction_id = $1 AND status = $2",
        )
        .bind(transaction_id.as_uuid())
        .bind(from.as_db_str())
        .bind(to.as_db_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                %transaction_id,
                from = from.as_db_str(),
                to = to.as_db_str(),
                "status transition conflict"
            );
            return Err(RegistryError::StatusConflict {
                expected: from.as_db_str().to_string(),
            });
        }
        tracing::debug!(%transaction_id, from = from.as_db_str(), to = to.as_db_str(), "status transitioned");
        Ok(())
    }

    async fn set_error(&self, transaction_id: SwapId, message: &str) -> Result<(), RegistryError> {
        sqlx::query("UPDATE swaps SET error = $2 WHERE transaction_id = $1")
            .bind(transaction_id.as_uuid())
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_final_sig(&self, transaction_id: SwapId, final_sig: &str) -> Result<(), RegistryError> {
        sqlx::query(
            "UPDATE swaps SET final_sig = $2, completed_at = now() WHERE transaction_id = $1",
        )
        .bind(transaction_id.as_uuid())
        .bind(final_sig)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_window(
        &self,
        window_id: &str,
        start: TimestampMillis,
        end: TimestampMillis,
        amount_lamports: u64,
    ) -> Result<(), RegistryError> {
        sqlx::query(
            "INSERT INTO mixing_windows (window_id, window_start, window_end, total_amount, tx_count) \
             VALUES ($1, $2, $3, $4, 1) \
             ON CONFLICT (window_id) DO UPDATE SET \
               total_amount = mixing_windows.total_amount + EXCLUDED.total_amount, \
               tx_count = mixing_windows.tx_count + 1",
        )
        .bind(window_id)
        .bind(to_chrono(start))
        .bind(to_chrono(end))
        .bind(lamports_to_decimal(amount_lamports))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_window(&self, window_id: &str) -> Result<Option<MixingWindow>, RegistryError> {
        #[derive(FromRow)]
        struct WindowRow {
            window_id: String,
            window_start: DateTime<Utc>,
            window_end: DateTime<Utc>,
            total_amount: Decimal,
            tx_count: i32,
        }

        let row: Option<WindowRow> = sqlx::query_as(
            "SELECT window_id, window_start, window_end, total_amount, tx_count \
             FROM mixing_windows WHERE window_id = $1",
        )
        .bind(window_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| MixingWindow {
            window_id: r.window_id,
            start: from_chrono(r.window_start),
            end: from_chrono(r.window_end),
            total_amount_lamports: decimal_to_lamports(r.total_amount).unwrap_or(0),
            tx_count: i64::from(r.tx_count),
        }))
    }

    async fn store_memo(&self, memo: NewMemo) -> Result<(), RegistryError> {
        sqlx::query(
            "INSERT INTO encrypted_memos (memo_id, transaction_id, ciphertext, metadata) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(memo.memo_id.as_uuid())
        .bind(memo.transaction_id.as_uuid())
        .bind(&memo.ciphertext)
        .bind(&memo.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_memo(&self, transaction_id: SwapId) -> Result<EncryptedMemo, RegistryError> {
        let row: MemoRow = sqlx::query_as(
            "SELECT memo_id, transaction_id, ciphertext, metadata \
             FROM encrypted_memos WHERE transaction_id = $1",
        )
        .bind(transaction_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RegistryError::MemoNotFound)?;

        Ok(EncryptedMemo {
            memo_id: MemoId::from_uuid(row.memo_id),
            transaction_id: SwapId::from_uuid(row.transaction_id),
            ciphertext: row.ciphertext,
            metadata: row.metadata,
        })
    }

    async fn get_swap(&self, transaction_id: SwapId) -> Result<Swap, RegistryError> {
        let row: SwapRow = sqlx::query_as(
            "SELECT transaction_id, source_addr, dest_addr, amount, intermediate_wallet_id, \
             source_sig, status, relayer_fee, final_sig, config_hash, created_at, \
             completed_at, error FROM swaps WHERE transaction_id = $1",
        )
        .bind(transaction_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RegistryError::SwapNotFound)?;

        let step_rows: Vec<StepRow> = sqlx::query_as(
            "SELECT transaction_id, step_index, from_addr, to_addr, tx_sig, amount, recorded_at \
             FROM swap_steps WHERE transaction_id = $1 ORDER BY step_index ASC",
        )
        .bind(transaction_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let steps = step_rows
            .into_iter()
            .map(|r| SwapStep {
                transaction_id: SwapId::from_uuid(r.transaction_id),
                step_index: r.step_index,
                from_addr: r.from_addr,
                to_addr: r.to_addr,
                tx_sig: r.tx_sig,
                amount_lamports: r.amount.and_then(decimal_to_lamports),
                recorded_at: from_chrono(r.recorded_at),
            })
            .collect();

        Ok(Swap {
            transaction_id: SwapId::from_uuid(row.transaction_id),
            source_addr: row.source_addr,
            dest_addr: row.dest_addr,
            amount_lamports: decimal_to_lamports(row.amount).unwrap_or(0),
            intermediate_wallet_id: WalletId::from_uuid(row.intermediate_wallet_id),
            source_sig: row.source_sig,
            status: row.status.parse().map_err(|_| RegistryError::SwapNotFound)?,
            relayer_fee_lamports: decimal_to_lamports(row.relayer_fee).unwrap_or(0),
            final_sig: row.final_sig,
            config_hash: row.config_hash,
            created_at: from_chrono(row.created_at),
            completed_at: row.completed_at.map(from_chrono),
            error: row.error,
            steps,
        })
    }

    async fn oldest_pending(&self, limit: i64) -> Result<Vec<Swap>, RegistryError> {
        let ids: Vec<(uuid::Uuid,)> = sqlx::query_as(
            "SELECT transaction_id FROM swaps WHERE status = 'pending' \
             ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut swaps = Vec::with_capacity(ids.len());
        for (id,) in ids {
            swaps.push(self.get_swap(SwapId::from_uuid(id)).await?);
        }
        Ok(swaps)
    }
}
