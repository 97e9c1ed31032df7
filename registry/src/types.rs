//! Swap Registry domain types (`spec.md` §3 "Data model").

use relayer_core::clock::TimestampMillis;
use relayer_core::ids::{MemoId, SwapId, WalletId};
use serde::{Deserialize, Serialize};

/// `spec.md` §3: `pending -> processing -> {completed, failed}`, plus
/// `pending -> recovered`. `processing -> recovered` is forbidden.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Recovered,
}

impl SwapStatus {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Recovered => "recovered",
        }
    }
}

impl std::str::FromStr for SwapStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "recovered" => Ok(Self::Recovered),
            other => Err(format!("unknown swap status: {other}")),
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Fields needed to create a new swap row. `transaction_id` is minted by the
/// caller (the Registry never generates its own id — `spec.md` §9 "Open
/// questions": "implementations should use the Registry-issued id end to
/// end", read here as "one id, minted once, used everywhere").
#[derive(Debug, Clone)]
pub struct NewSwap {
    pub transaction_id: SwapId,
    pub source_addr: String,
    pub dest_addr: String,
    pub amount_lamports: u64,
    pub intermediate_wallet_id: WalletId,
    pub source_sig: String,
    pub relayer_fee_lamports: u64,
    pub config_hash: String,
}

#[derive(Debug, Clone)]
pub struct Swap {
    pub transaction_id: SwapId,
    pub source_addr: String,
    pub dest_addr: String,
    pub amount_lamports: u64,
    pub intermediate_wallet_id: WalletId,
    pub source_sig: String,
    pub status: SwapStatus,
    pub relayer_fee_lamports: u64,
    pub final_sig: Option<String>,
    pub config_hash: String,
    pub created_at: TimestampMillis,
    pub completed_at: Option<TimestampMillis>,
    pub error: Option<String>,
    pub steps: Vec<SwapStep>,
}

#[derive(Debug, Clone)]
pub struct NewStep {
    pub from_addr: String,
    pub to_addr: String,
    pub tx_sig: String,
    pub amount_lamports: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SwapStep {
    pub transaction_id: SwapId,
    pub step_index: i32,
    pub from_addr: String,
    pub to_addr: String,
    pub tx_sig: String,
    pub amount_lamports: Option<u64>,
    pub recorded_at: TimestampMillis,
}

#[derive(Debug, Clone)]
pub struct MixingWindow {
    pub window_id: String,
    pub start: TimestampMillis,
    pub end: TimestampMillis,
    pub total_amount_lamports: u64,
    pub tx_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewMemo {
    pub memo_id: MemoId,
    pub transaction_id: SwapId,
    pub ciphertext: Vec<u8>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct EncryptedMemo {
    pub memo_id: MemoId,
    pub transaction_id: SwapId,
    pub ciphertext: Vec<u8>,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_db_str_roundtrips_through_from_str() {
        for status in [
            SwapStatus::Pending,
            SwapStatus::Processing,
            SwapStatus::Completed,
            SwapStatus::Failed,
            SwapStatus::Recovered,
        ] {
            let parsed: SwapStatus = status.as_db_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_from_str_rejects_unknown() {
        assert!("bogus".parse::<SwapStatus>().is_err());
    }

    #[test]
    fn status_display_matches_db_str() {
        assert_eq!(SwapStatus::Processing.to_string(), "processing");
    }
}
