//! The Monitor hands an admitted swap off to a [`SwapAdmitter`] rather than
//! depending on `relayer-coordinator` directly, keeping the two crates'
//! dependency graph acyclic and letting the Monitor's own tests run against
//! a fake admitter (`spec.md` §8: components are tested in isolation behind
//! injected collaborators).

use async_trait::async_trait;
use relayer_registry::Swap;

#[async_trait]
pub trait SwapAdmitter: Send + Sync {
    /// Transitions `swap` to `processing` and drives it through the Mixing
    /// Coordinator's state machine. Errors are the admitter's concern: a
    /// failed run is reported via the Registry, never by returning here.
    async fn admit(&self, swap: Swap);
}
