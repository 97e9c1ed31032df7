//! Durable storage for [`IntermediateWallet`] rows.
//!
//! The Vault is the sole owner of this table (`spec.md` §3 "Ownership"): no
//! other crate ever reads `encrypted_secret` directly, and every row change
//! (`insert`, `mark_used`) funnels through here so a crash mid-swap leaves
//! the wallet's `active` flag and `encrypted_secret` in a consistent state.
//!
//! Runtime-checked `sqlx::query`/`query_as` are used in place of the
//! `query!`/`query_as!` macros: the macros validate against a live database
//! (or a committed `.sqlx` offline cache) at compile time, neither of which
//! this workspace has checked in. See `DESIGN.md`.

use async_trait::async_trait;
use relayer_core::clock::TimestampMillis;
use relayer_core::ids::WalletId;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::VaultError;
use crate::wallet::IntermediateWallet;

#[derive(FromRow)]
struct WalletRow {
    wallet_id: uuid::Uuid,
    public_key: String,
    encrypted_secret: Vec<u8>,
    active: bool,
}

/// Persistence for intermediate wallet rows.
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn insert(&self, wallet: &IntermediateWallet) -> Result<(), VaultError>;

    /// Fetches a wallet by id. Returns [`VaultError::NotFound`] if absent.
    async fn fetch(&self, wallet_id: WalletId) -> Result<IntermediateWallet, VaultError>;

    /// Marks a wallet inactive and stamps `used_at`. Idempotent.
    async fn mark_used(&self, wallet_id: WalletId, used_at: TimestampMillis) -> Result<(), VaultError>;
}

/// Postgres-backed [`WalletStore`].
pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    pub async fn connect(database_url: &str) -> Result<Self, VaultError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(VaultError::Db)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn insert(&self, wallet: &IntermediateWallet) -> Result<(), VaultError> {
        sqlx::query(
            "INSERT INTO intermediate_wallets \
             (wallet_id, public_key, encrypted_secret, created_at, active) \
             VALUES ($1, $2, $3, now(), true)",
        )
        .bind(wallet.id.as_uuid())
        .bind(wallet.pubkey.to_string())
        .bind(&wallet.encrypted_secret_key)
        .execute(&self.pool)
        .await
        .map_err(VaultError::Db)?;
        Ok(())
    }

    async fn fetch(&self, wallet_id: WalletId) -> Result<IntermediateWallet, VaultError> {
        let row: WalletRow = sqlx::query_as(
            "SELECT wallet_id, public_key, encrypted_secret, active \
             FROM intermediate_wallets WHERE wallet_id = $1",
        )
        .bind(wallet_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(VaultError::Db)?
        .ok_or(VaultError::NotFound)?;

        let pubkey = row
            .public_key
            .parse()
            .map_err(|_| VaultError::CorruptRow)?;

        Ok(IntermediateWallet {
            id: WalletId::from_uuid(row.wallet_id),
            pubkey,
            encrypted_secret_key: row.encrypted_secret,
            used: !row.active,
        })
    }

    async fn mark_used(&self, wallet_id: WalletId, used_at: TimestampMillis) -> Result<(), VaultError> {
        let used_at_secs = used_at.as_i64() / 1000;
        sqlx::query(
            "UPDATE intermediate_wallets SET active = false, used_at = to_timestamp($2) \
             WHERE wallet_id = $1",
        )
        .bind(wallet_id.as_uuid())
        .bind(used_at_secs as f64)
        .execute(&self.pool)
        .await
        .map_err(VaultError::Db)?;
        Ok(())
    }
}
