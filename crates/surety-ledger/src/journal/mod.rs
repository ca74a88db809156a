//! Event journal and ledger snapshots

pub mod events;
pub mod snapshot;

pub use events::{EventEnvelope, EventJournal, LedgerEvent};
pub use snapshot::LedgerSnapshot;
