//! Shared state handed to every Control Surface route handler.

use std::sync::Arc;

use relayer_chain::SolanaRpc;
use relayer_coordinator::MixingCoordinator;
use relayer_core::clock::Clock;
use relayer_core::config::Network;
use relayer_ledger::RecoveryLedger;
use relayer_registry::Registry;
use relayer_vault::Vault;

/// Everything a handler needs: one `Arc` per collaborator, cheap to clone
/// per request the way `axum::extract::State` expects.
pub struct AppState<R: SolanaRpc> {
    pub vault: Arc<Vault<R>>,
    pub registry: Arc<Registry>,
    pub ledger: Arc<RecoveryLedger>,
    pub coordinator: Arc<MixingCoordinator<R>>,
    pub clock: Arc<dyn Clock>,
    pub network: Network,
}

impl<R: SolanaRpc> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            vault: self.vault.clone(),
            registry: self.registry.clone(),
            ledger: self.ledger.clone(),
            coordinator: self.coordinator.clone(),
            clock: self.clock.clone(),
            network: self.network,
        }
    }
}
