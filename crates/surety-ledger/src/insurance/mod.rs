//! Insurance accounting
//!
//! - **Ledger**: purchases, crediting, payouts
//! - **Treasury**: funds held against outstanding credit

pub mod ledger;
pub mod treasury;

pub use ledger::{InsuranceLedger, Payout, Policy, Settlement};
pub use treasury::Treasury;
