//! Force accounting: battalions and the per-session ledger

pub mod battalion;
pub mod ledger;

pub use battalion::{Battalion, ForceSlot};
pub use ledger::{ChangeSet, DeltaEntry, ForceLedger, LedgerDelta, LedgerError, LedgerSnapshot, SnapshotEntry};
