//! Swap Registry: durable storage for swaps, their steps, mixing windows,
//! and encrypted memos (`spec.md` §4.5).

pub mod error;
pub mod registry;
pub mod store;
pub mod test_utils;
pub mod types;

pub use error::RegistryError;
pub use registry::Registry;
pub use store::{PgSwapStore, SwapStore};
pub use types::{
    EncryptedMemo, MixingWindow, NewMemo, NewStep, NewSwap, Swap, SwapStatus, SwapStep,
};
