//! Recovery Ledger: the global deposit counter and per-swap recovery
//! bookkeeping behind the emergency direct-withdrawal path (`spec.md` §4.2).

pub mod error;
pub mod ledger;
pub mod store;
pub mod test_utils;

pub use error::LedgerError;
pub use ledger::{Availability, AvailabilityReason, RecoveryLedger};
pub use store::{LedgerStore, PgLedgerStore, RecoveryRecord};
