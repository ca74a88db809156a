//! # Surety Common
//!
//! Shared types, errors, and protocol constants for the Surety flight-delay
//! insurance ledger.
//!
//! ## Core Types
//!
//! - [`AccountId`]: 20-byte identity for owners, airlines, passengers, and oracles
//! - [`Amount`]: unsigned base-unit currency quantity
//! - [`FlightKey`]/[`StatusCode`]: flight identity and oracle-reported status
//! - [`CreditBalance`]: payout owed to a passenger

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AirlineError, FlightError, InsuranceError, OracleError, Result, SuretyError};
pub use types::{
    account::AccountId,
    amount::{Amount, BASE_UNITS_PER_UNIT},
    credit::CreditBalance,
    flight::{FlightKey, StatusCode},
};

/// Surety version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exact contribution that makes an airline funded (10 units)
pub const PARTICIPATION_FUND: Amount = Amount::units(10);

/// Maximum cumulative insurance per passenger per flight (1 unit)
pub const INSURANCE_PAY_LIMIT: Amount = Amount::units(1);

/// Fee an oracle pays to register (1 unit)
pub const REGISTRATION_FEE: Amount = Amount::units(1);

/// Agreeing oracle responses needed to finalise a status request
pub const MIN_RESPONSES: usize = 3;

/// Registered-airline count at which admission switches to voting
pub const CONSENSUS_THRESHOLD: usize = 4;

/// Indices assigned to each oracle
pub const INDEXES_PER_ORACLE: usize = 3;

/// Oracle indices are drawn from `0..ORACLE_INDEX_SPACE`
pub const ORACLE_INDEX_SPACE: u8 = 10;

/// Payout multiplier applied when crediting, as numerator / denominator
pub const CREDIT_MULTIPLIER: (u128, u128) = (3, 2);
