//! The concrete [`SwapAdmitter`]: hands an admitted swap to the Mixing
//! Coordinator as a detached task (`spec.md` §5 "Each swap's Coordinator run
//! is a detached `tokio::spawn`").

use std::sync::Arc;

use async_trait::async_trait;
use relayer_chain::SolanaRpc;
use relayer_coordinator::MixingCoordinator;
use relayer_core::rng::SysRng;
use relayer_monitor::SwapAdmitter;
use relayer_registry::{Registry, Swap, SwapStatus};

pub struct CoordinatorAdmitter<R: SolanaRpc + 'static> {
    registry: Arc<Registry>,
    coordinator: Arc<MixingCoordinator<R>>,
}

impl<R: SolanaRpc + 'static> CoordinatorAdmitter<R> {
    pub fn new(registry: Arc<Registry>, coordinator: Arc<MixingCoordinator<R>>) -> Self {
        Self { registry, coordinator }
    }
}

#[async_trait]
impl<R: SolanaRpc + 'static> SwapAdmitter for CoordinatorAdmitter<R> {
    async fn admit(&self, swap: Swap) {
        let transaction_id = swap.transaction_id;
        if let Err(err) = self
            .registry
            .transition_status(transaction_id, SwapStatus::Pending, SwapStatus::Processing)
            .await
        {
            tracing::warn!(%transaction_id, error = %err, "lost admission race, skipping");
            return;
        }

        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            let mut rng = SysRng::new();
            if let Err(err) = coordinator.run(transaction_id, &mut rng).await {
                tracing::error!(%transaction_id, error = %err, "mixing coordinator run failed");
            }
        });
    }
}
