//! Deposit Monitor: polls `pending` swaps and admits the ones whose
//! deposit is confirmed and fully funded (`spec.md` §4.3).

pub mod admitter;
pub mod error;
pub mod monitor;

pub use admitter::SwapAdmitter;
pub use error::MonitorError;
pub use monitor::{DepositMonitor, DEFAULT_POLL_INTERVAL, DEFAULT_TICK_CAPACITY};
