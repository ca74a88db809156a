//! Core data types for the Surety ledger

pub mod account;
pub mod amount;
pub mod credit;
pub mod flight;

pub use account::AccountId;
pub use amount::Amount;
pub use credit::CreditBalance;
pub use flight::{FlightKey, StatusCode};
