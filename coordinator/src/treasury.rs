//! Optional process-wide treasury capability (`spec.md` §4.4 step 2, §9
//! "Treasury as optional capability"): consulted only when a freshly
//! allocated wallet cannot be primed from its own funding source. Absence is
//! a legitimate configuration — the Coordinator fails with `CannotPrime`
//! instead of falling back to it.

use std::sync::Arc;

use relayer_chain::SolanaRpc;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

use crate::error::CoordinatorError;

pub struct Treasury<R: SolanaRpc> {
    keypair: Keypair,
    rpc: Arc<R>,
}

impl<R: SolanaRpc> Treasury<R> {
    pub fn new(keypair: Keypair, rpc: Arc<R>) -> Self {
        Self { keypair, rpc }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Sends `lamports` from the treasury to `recipient`, used only to
    /// cover a freshly allocated wallet's fee/rent reserve when its own
    /// funding source can't.
    pub async fn fund(&self, recipient: &Pubkey, lamports: u64) -> Result<(), CoordinatorError> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction =
            relayer_chain::build_transfer(&self.keypair, recipient, lamports, recent_blockhash);
        self.rpc.send_and_confirm(&transaction).await?;
        Ok(())
    }
}
