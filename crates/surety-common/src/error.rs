//! Error types for the Surety ledger
//!
//! Provides a unified error type and domain-specific error variants. Every
//! failure is scoped to the single call that produced it; no variant is fatal
//! to the engine.

use crate::types::{AccountId, Amount};
use thiserror::Error;

/// Result type alias using SuretyError
pub type Result<T> = std::result::Result<T, SuretyError>;

/// Unified error type for Surety operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SuretyError {
    // Operational gate
    #[error("Contract is currently not operational")]
    SystemPaused,

    #[error("Caller is not contract owner")]
    Unauthorized,

    // Domain errors
    #[error("Airline error: {0}")]
    Airline(#[from] AirlineError),

    #[error("Flight error: {0}")]
    Flight(#[from] FlightError),

    #[error("Insurance error: {0}")]
    Insurance(#[from] InsuranceError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    // Value errors
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount arithmetic overflow")]
    Overflow,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SuretyError {
    /// Stable taxonomy name of the failure, independent of the message text.
    pub fn code(&self) -> &'static str {
        match self {
            SuretyError::SystemPaused => "SystemPaused",
            SuretyError::Unauthorized => "Unauthorized",
            SuretyError::Airline(e) => e.code(),
            SuretyError::Flight(e) => e.code(),
            SuretyError::Insurance(e) => e.code(),
            SuretyError::Oracle(e) => e.code(),
            SuretyError::InvalidAmount => "InvalidAmount",
            SuretyError::Overflow => "Overflow",
            SuretyError::Config(_) => "Config",
            SuretyError::Serialization(_) => "Serialization",
        }
    }
}

/// Airline admission and funding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AirlineError {
    #[error("the caller airline has not paid participation fee: {caller}")]
    CallerNotFunded { caller: AccountId },

    #[error("the caller airline has already voted for passed in airline: {voter} -> {candidate}")]
    DuplicateVote {
        voter: AccountId,
        candidate: AccountId,
    },

    #[error("Airline over funded the surety: funded {funded} + {attempted} > {cap}")]
    FundingExceedsCap {
        funded: Amount,
        attempted: Amount,
        cap: Amount,
    },
}

impl AirlineError {
    pub fn code(&self) -> &'static str {
        match self {
            AirlineError::CallerNotFunded { .. } => "CallerNotFunded",
            AirlineError::DuplicateVote { .. } => "DuplicateVote",
            AirlineError::FundingExceedsCap { .. } => "FundingExceedsCap",
        }
    }
}

/// Flight registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlightError {
    #[error("airline is not registered yet: {airline}")]
    AirlineNotRegistered { airline: AccountId },

    #[error("flight must be in future: departure {timestamp} <= now {now}")]
    FlightInPast { timestamp: i64, now: i64 },

    #[error("flight is already registered: {flight}")]
    FlightAlreadyRegistered { flight: String },

    #[error("Flight is not registered yet: {flight}")]
    FlightNotRegistered { flight: String },
}

impl FlightError {
    pub fn code(&self) -> &'static str {
        match self {
            FlightError::AirlineNotRegistered { .. } => "AirlineNotRegistered",
            FlightError::FlightInPast { .. } => "FlightInPast",
            FlightError::FlightAlreadyRegistered { .. } => "FlightAlreadyRegistered",
            FlightError::FlightNotRegistered { .. } => "FlightNotRegistered",
        }
    }
}

/// Insurance purchase and payout errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InsuranceError {
    #[error("Passenger overbought the insurance: paid {paid} + {attempted} > {limit}")]
    InsuranceOverbought {
        paid: Amount,
        attempted: Amount,
        limit: Amount,
    },

    #[error("No credit owed to passenger {passenger}")]
    NoCreditOwed { passenger: AccountId },

    #[error("Treasury cannot cover payout: owed {owed}, held {held}")]
    TreasuryShortfall { owed: Amount, held: Amount },
}

impl InsuranceError {
    pub fn code(&self) -> &'static str {
        match self {
            InsuranceError::InsuranceOverbought { .. } => "InsuranceOverbought",
            InsuranceError::NoCreditOwed { .. } => "NoCreditOwed",
            InsuranceError::TreasuryShortfall { .. } => "TreasuryShortfall",
        }
    }
}

/// Oracle registration and response errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Registration fee is required: paid {paid}, required {required}")]
    InsufficientFee { paid: Amount, required: Amount },

    #[error("Oracle is already registered: {oracle}")]
    AlreadyRegistered { oracle: AccountId },

    #[error("Index does not match oracle request: {oracle} does not hold index {index}")]
    CallerNotOracleForIndex { oracle: AccountId, index: u8 },

    #[error("Status request is already closed: index {index} for {flight}")]
    RequestAlreadyClosed { index: u8, flight: String },

    #[error("Flight or timestamp do not match oracle request: index {index} for {flight}")]
    StatusRequestNotFound { index: u8, flight: String },

    #[error("Oracle {oracle} already responded to request index {index}")]
    DuplicateResponse { oracle: AccountId, index: u8 },
}

impl OracleError {
    pub fn code(&self) -> &'static str {
        match self {
            OracleError::InsufficientFee { .. } => "InsufficientFee",
            OracleError::AlreadyRegistered { .. } => "AlreadyRegistered",
            OracleError::CallerNotOracleForIndex { .. } => "CallerNotOracleForIndex",
            OracleError::RequestAlreadyClosed { .. } => "RequestAlreadyClosed",
            OracleError::StatusRequestNotFound { .. } => "StatusRequestNotFound",
            OracleError::DuplicateResponse { .. } => "DuplicateResponse",
        }
    }
}

impl From<serde_json::Error> for SuretyError {
    fn from(err: serde_json::Error) -> Self {
        SuretyError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let caller = AccountId::derive("airline-1");
        let err = SuretyError::from(AirlineError::CallerNotFunded { caller });
        assert!(err.to_string().contains("has not paid participation fee"));
        assert!(err.to_string().contains(&caller.to_string()));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SuretyError::SystemPaused.code(), "SystemPaused");

        let err = SuretyError::from(InsuranceError::InsuranceOverbought {
            paid: Amount::from_base(5),
            attempted: Amount::from_base(6),
            limit: Amount::from_base(10),
        });
        assert_eq!(err.code(), "InsuranceOverbought");
        assert!(err.to_string().contains("5 + 6 > 10"));

        let err = SuretyError::from(OracleError::RequestAlreadyClosed {
            index: 4,
            flight: "UA100".to_string(),
        });
        assert_eq!(err.code(), "RequestAlreadyClosed");
    }
}
