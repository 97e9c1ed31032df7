use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

/// Builds a signed native-SOL transfer from `payer` to `recipient` for
/// `lamports`, using `recent_blockhash` as the transaction's blockhash.
///
/// Mirrors the `system_instruction::transfer` + `Transaction::
/// new_signed_with_payer` pattern used throughout the retrieved Solana
/// relayer examples.
pub fn build_transfer(
    payer: &(impl Signer + ?Sized),
    recipient: &Pubkey,
    lamports: u64,
    recent_blockhash: Hash,
) -> Transaction {
    build_multi_transfer(payer, &[(*recipient, lamports)], recent_blockhash)
}

/// Builds a signed native-SOL transfer from `payer` to one or more
/// `recipients`, one `system_instruction::transfer` per recipient in the
/// same transaction. Used for the finalize step's two-recipient
/// `{dest, fee_wallet}` payout (`spec.md` §4.4 step 8).
pub fn build_multi_transfer(
    payer: &(impl Signer + ?Sized),
    recipients: &[(Pubkey, u64)],
    recent_blockhash: Hash,
) -> Transaction {
    assert!(!recipients.is_empty(), "build_multi_transfer: no recipients");
    let instructions: Vec<_> = recipients
        .iter()
        .map(|(recipient, lamports)| {
            system_instruction::transfer(&payer.pubkey(), recipient, *lamports)
        })
        .collect();
    Transaction::new_signed_with_payer(
        &instructions,
        Some(&payer.pubkey()),
        &[payer],
        recent_blockhash,
    )
}

#[cfg(test)]
mod test {
    use solana_sdk::signature::Keypair;

    use super::*;

    #[test]
    fn build_transfer_is_signed_by_payer() {
        let payer = Keypair::new();
        let recipient = Pubkey::new_unique();
        let tx = build_transfer(&payer, &recipient, 1_000, Hash::default());
        assert!(tx.is_signed());
        assert_eq!(tx.message.account_keys[0], payer.pubkey());
    }

    #[test]
    fn build_multi_transfer_carries_one_instruction_per_recipient() {
        let payer = Keypair::new();
        let recipients =
            [(Pubkey::new_unique(), 1_000), (Pubkey::new_unique(), 2_000)];
        let tx =
            build_multi_transfer(&payer, &recipients, Hash::default());
        assert!(tx.is_signed());
        assert_eq!(tx.message.instructions.len(), 2);
    }
}
