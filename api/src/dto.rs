//! Request/response bodies for the Control Surface (`spec.md` §6). All JSON
//! keys are camelCase to match the browser client the Control Surface is
//! specified against.

use relayer_core::ids::{SwapId, WalletId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Converts a SOL-denominated request field to lamports, rejecting negative
/// or non-finite amounts before they ever reach a domain type.
pub fn sol_to_lamports(amount: f64) -> Result<u64, ApiError> {
    if !amount.is_finite() || amount.is_sign_negative() {
        return Err(ApiError::Validation("amount must be a non-negative finite number".to_string()));
    }
    let decimal = Decimal::from_f64_retain(amount)
        .ok_or_else(|| ApiError::Validation("amount could not be parsed as decimal SOL".to_string()))?;
    relayer_core::money::decimal_to_lamports(decimal)
        .ok_or_else(|| ApiError::Validation("amount overflows lamport precision".to_string()))
}

/// Validates `amount_lamports` falls within `[MIN_SWAP, MAX_SWAP]`
/// (`spec.md` §6 "Immutable constants", §8 "Boundary tests").
pub fn validate_swap_amount(amount_lamports: u64) -> Result<(), ApiError> {
    use relayer_core::constants::{MAX_SWAP_LAMPORTS, MIN_SWAP_LAMPORTS};
    if amount_lamports < MIN_SWAP_LAMPORTS {
        return Err(ApiError::Validation(format!(
            "amount must be at least {} lamports ({} SOL)",
            MIN_SWAP_LAMPORTS,
            lamports_to_sol(MIN_SWAP_LAMPORTS)
        )));
    }
    if let Some(max) = MAX_SWAP_LAMPORTS {
        if amount_lamports > max {
            return Err(ApiError::Validation(format!("amount must be at most {max} lamports")));
        }
    }
    Ok(())
}

/// Parses a base58 Solana address, mapping a malformed address to a 400
/// (`spec.md` §6 "validate inputs": "address parses").
pub fn parse_pubkey(field: &str, value: &str) -> Result<solana_sdk::pubkey::Pubkey, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::Validation(format!("{field} is not a valid Solana address: {value}")))
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    relayer_core::money::lamports_to_decimal(lamports)
        .to_string()
        .parse()
        .expect("Decimal -> f64 string roundtrip never fails")
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
    pub network: String,
    #[serde(rename = "privacyMode")]
    pub privacy_mode: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub relayer_fee_pct: f64,
    pub deposit_fee_pct: f64,
    pub min_swap: f64,
    pub max_swap: Option<f64>,
    pub max_notes: u32,
    pub default_notes: u32,
    pub min_notes: u32,
    pub mixing_window: u64,
    pub min_split: f64,
    pub obfuscation_range: f64,
    pub recovery_threshold: u32,
    pub recovery_timeout: u64,
    pub fee_reserve: f64,
    pub config_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub source_wallet: String,
    pub destination_wallet: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateWalletDto {
    pub public_key: String,
    pub wallet_id: WalletId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryGrant {
    pub recovery_key: String,
    pub recovery_key_hash: String,
    pub threshold: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositInstructions {
    pub recipient: String,
    pub minimum_lamports: u64,
    pub memo: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    pub intermediate_wallet: IntermediateWalletDto,
    pub fee: f64,
    pub recovery: RecoveryGrant,
    pub instructions: DepositInstructions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub source_wallet: String,
    pub destination_wallet: String,
    pub amount: f64,
    pub source_tx_signature: String,
    pub intermediate_wallet_id: WalletId,
    pub recovery_key: Option<String>,
    pub encrypted_memo: Option<EncryptedMemoPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedMemoPayload {
    /// Hex-encoded opaque ciphertext. The server stores and returns this
    /// verbatim; it never decrypts it (`spec.md` §1 "client-side ...
    /// encryption" is out of scope).
    pub ciphertext: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub transaction_id: SwapId,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapStepDto {
    pub step_index: i32,
    pub from_addr: String,
    pub to_addr: String,
    pub tx_sig: String,
    pub amount: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapStatusResponse {
    pub transaction_id: SwapId,
    pub source_addr: String,
    pub dest_addr: String,
    pub amount: f64,
    pub status: relayer_registry::SwapStatus,
    pub relayer_fee: f64,
    pub final_sig: Option<String>,
    pub config_hash: String,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub error: Option<String>,
    pub steps: Vec<SwapStepDto>,
}

impl From<relayer_registry::Swap> for SwapStatusResponse {
    fn from(swap: relayer_registry::Swap) -> Self {
        Self {
            transaction_id: swap.transaction_id,
            source_addr: swap.source_addr,
            dest_addr: swap.dest_addr,
            amount: lamports_to_sol(swap.amount_lamports),
            status: swap.status,
            relayer_fee: lamports_to_sol(swap.relayer_fee_lamports),
            final_sig: swap.final_sig,
            config_hash: swap.config_hash,
            created_at: swap.created_at.as_i64(),
            completed_at: swap.completed_at.map(|t| t.as_i64()),
            error: swap.error,
            steps: swap
                .steps
                .into_iter()
                .map(|s| SwapStepDto {
                    step_index: s.step_index,
                    from_addr: s.from_addr,
                    to_addr: s.to_addr,
                    tx_sig: s.tx_sig,
                    amount: s.amount_lamports.map(lamports_to_sol),
                    timestamp: s.recorded_at.as_i64(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateBalanceResponse {
    pub public_key: String,
    pub balance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryAvailabilityResponse {
    pub available: bool,
    pub reason: &'static str,
    pub details: String,
}

impl From<relayer_ledger::Availability> for RecoveryAvailabilityResponse {
    fn from(a: relayer_ledger::Availability) -> Self {
        let reason = match a.reason {
            relayer_ledger::AvailabilityReason::Threshold => "threshold",
            relayer_ledger::AvailabilityReason::Timeout => "timeout",
            relayer_ledger::AvailabilityReason::None => "none",
        };
        Self { available: a.available, reason, details: a.details }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverRequest {
    pub recovery_key: String,
    pub destination_wallet: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverResponse {
    pub success: bool,
    pub tx_signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoResponse {
    pub encrypted: String,
    pub metadata: serde_json::Value,
}
