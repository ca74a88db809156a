//! Credit Balance - payout owed to an insured passenger
//!
//! Key characteristics:
//! - Increased only by crediting a settled flight
//! - Drained to zero in one step by a payout
//! - Lifetime totals kept for audit
//! - Version field bumps on every mutation

use crate::error::{InsuranceError, Result, SuretyError};
use crate::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

/// Credit owed to a passenger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Passenger this balance belongs to
    pub passenger: AccountId,

    /// Currently owed, not yet paid out
    pub owed: Amount,

    /// Sum of every credit ever applied
    pub total_credited: Amount,

    /// Sum of every payout ever made
    pub total_paid: Amount,

    /// Mutation counter
    pub version: u64,
}

impl CreditBalance {
    pub fn new(passenger: AccountId) -> Self {
        Self {
            passenger,
            owed: Amount::ZERO,
            total_credited: Amount::ZERO,
            total_paid: Amount::ZERO,
            version: 0,
        }
    }

    /// Add a credit to the owed balance
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        let owed = self.owed.checked_add(amount).ok_or(SuretyError::Overflow)?;
        let total = self
            .total_credited
            .checked_add(amount)
            .ok_or(SuretyError::Overflow)?;

        self.owed = owed;
        self.total_credited = total;
        self.version += 1;
        Ok(())
    }

    /// Drain the owed balance, returning the amount to transfer
    pub fn withdraw_all(&mut self) -> Result<Amount> {
        if self.owed.is_zero() {
            return Err(InsuranceError::NoCreditOwed {
                passenger: self.passenger,
            }
            .into());
        }

        let amount = self.owed;
        let total = self
            .total_paid
            .checked_add(amount)
            .ok_or(SuretyError::Overflow)?;

        self.owed = Amount::ZERO;
        self.total_paid = total;
        self.version += 1;
        Ok(amount)
    }
}

impl std::fmt::Display for CreditBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CreditBalance(owed={}, credited={}, paid={})",
            self.owed, self.total_credited, self.total_paid
        )
    }
}
