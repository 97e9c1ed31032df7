//! Mixing Coordinator: drives a swap through split, deposit, mixing-window
//! dwell, withdraw, merge, hop, and finalize (`spec.md` §4.4), plus the
//! emergency recovery path (`spec.md` §4.2).

pub mod coordinator;
pub mod error;
pub mod fee;
pub mod split_plan;
pub mod strategy;
pub mod timing;
pub mod treasury;
pub mod window;

pub use coordinator::MixingCoordinator;
pub use error::CoordinatorError;
pub use fee::compute_relayer_fee_lamports;
pub use strategy::StrategyProfile;
pub use treasury::Treasury;
