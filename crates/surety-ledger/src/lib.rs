//! # Surety Ledger
//!
//! Flight-delay insurance ledger with airline admission consensus and
//! oracle status agreement.
//!
//! ## Components
//!
//! - **Gate**: owner-controlled pause switch guarding every mutation
//! - **Registry**: airline admission, funding, and flight registration
//! - **Insurance**: capped purchases, once-per-flight crediting, payouts
//! - **Consensus**: oracle registration and response quorum
//! - **Journal**: event log with live subscriptions, and snapshots
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SuretyLedger                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     OperationalGate                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Airline /  │  │  Insurance  │  │  Oracle Consensus   │  │
//! │  │   Flight    │──│   Ledger    │──│ (index + quorum)    │  │
//! │  │  Registry   │  │ + Treasury  │  │                     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │                       EventJournal                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod gate;
pub mod insurance;
pub mod journal;
pub mod registry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PayoutPolicy, SuretyConfig};
pub use consensus::{FetchTicket, OpenOutcome, OracleIndexes, RequestKey, ResponseOutcome};
pub use engine::{SharedLedger, SuretyLedger};
pub use gate::{Live, OperationalGate};
pub use insurance::{Settlement, Treasury};
pub use journal::{EventEnvelope, LedgerEvent, LedgerSnapshot};
pub use registry::{Admission, Airline, Flight};
