use axum::extract::State;
use axum::Json;
use relayer_chain::SolanaRpc;
use relayer_core::ids::{MemoId, SwapId};
use relayer_core::rng::SysRng;
use relayer_ledger::RecoveryLedger;
use relayer_registry::{NewMemo, NewSwap};

use crate::dto::{parse_pubkey, sol_to_lamports, validate_swap_amount, InitiateRequest, InitiateResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/swap/initiate` (`spec.md` §6): creates the durable `pending`
/// swap row the Deposit Monitor will pick up, opens its recovery record, and
/// stores an opaque encrypted memo if the caller supplied one. Business
/// logic stops here — admission and mixing happen asynchronously.
pub async fn initiate<R: SolanaRpc>(
    State(state): State<AppState<R>>,
    Json(req): Json<InitiateRequest>,
) -> Result<Json<InitiateResponse>, ApiError> {
    parse_pubkey("sourceWallet", &req.source_wallet)?;
    parse_pubkey("destinationWallet", &req.destination_wallet)?;
    if req.source_tx_signature.trim().is_empty() {
        return Err(ApiError::Validation("sourceTxSignature is required".to_string()));
    }

    let amount_lamports = sol_to_lamports(req.amount)?;
    validate_swap_amount(amount_lamports)?;

    let mut rng = SysRng::new();
    let transaction_id = SwapId::new(&mut rng);
    let relayer_fee_lamports = relayer_coordinator::compute_relayer_fee_lamports(amount_lamports);
    let config_hash = relayer_core::config_hash::config_hash_hex();

    state
        .registry
        .create_swap(NewSwap {
            transaction_id,
            source_addr: req.source_wallet,
            dest_addr: req.destination_wallet,
            amount_lamports,
            intermediate_wallet_id: req.intermediate_wallet_id,
            source_sig: req.source_tx_signature,
            relayer_fee_lamports,
            config_hash,
        })
        .await?;

    let deposit_count_at_creation = state.ledger.increment().await?;
    let recovery_key_hash = match req.recovery_key {
        Some(key) => RecoveryLedger::hash_recovery_key(&key),
        None => {
            let mut bytes = [0u8; 32];
            relayer_core::rng::RngCore::fill_bytes(&mut rng, &mut bytes);
            RecoveryLedger::hash_recovery_key(&hex::encode(bytes))
        }
    };
    state
        .ledger
        .open(transaction_id, deposit_count_at_creation, &recovery_key_hash)
        .await?;

    if let Some(memo) = req.encrypted_memo {
        let ciphertext = hex::decode(&memo.ciphertext)
            .map_err(|_| ApiError::Validation("encryptedMemo.ciphertext must be hex-encoded".to_string()))?;
        state
            .registry
            .store_memo(NewMemo {
                memo_id: MemoId::new(&mut rng),
                transaction_id,
                ciphertext,
                metadata: memo.metadata,
            })
            .await?;
    }

    Ok(Json(InitiateResponse { transaction_id, status: "pending" }))
}
