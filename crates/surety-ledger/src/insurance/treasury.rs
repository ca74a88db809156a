//! Funds held by the ledger
//!
//! Participation funds, premiums, and oracle fees flow in; payouts flow out.
//! A payout larger than what is held is refused rather than going negative.

use crate::gate::Live;
use serde::{Deserialize, Serialize};
use surety_common::{Amount, InsuranceError, Result, SuretyError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    held: Amount,
    total_deposited: Amount,
    total_disbursed: Amount,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> Amount {
        self.held
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_disbursed(&self) -> Amount {
        self.total_disbursed
    }

    /// Check a deposit would not overflow, without applying it
    pub fn ensure_can_deposit(&self, amount: Amount) -> Result<()> {
        self.held.checked_add(amount).ok_or(SuretyError::Overflow)?;
        self.total_deposited
            .checked_add(amount)
            .ok_or(SuretyError::Overflow)?;
        Ok(())
    }

    pub fn deposit(&mut self, _live: Live<'_>, amount: Amount) -> Result<Amount> {
        let held = self.held.checked_add(amount).ok_or(SuretyError::Overflow)?;
        let total = self
            .total_deposited
            .checked_add(amount)
            .ok_or(SuretyError::Overflow)?;

        self.held = held;
        self.total_deposited = total;
        Ok(held)
    }

    /// Check a payout is covered, without applying it
    pub fn ensure_covers(&self, amount: Amount) -> Result<()> {
        if amount > self.held {
            return Err(InsuranceError::TreasuryShortfall {
                owed: amount,
                held: self.held,
            }
            .into());
        }
        Ok(())
    }

    pub fn disburse(&mut self, _live: Live<'_>, amount: Amount) -> Result<Amount> {
        self.ensure_covers(amount)?;
        let total = self
            .total_disbursed
            .checked_add(amount)
            .ok_or(SuretyError::Overflow)?;

        self.held = self.held.checked_sub(amount).ok_or(SuretyError::Overflow)?;
        self.total_disbursed = total;
        Ok(self.held)
    }
}
