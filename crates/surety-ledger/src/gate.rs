//! Operational gate
//!
//! A single pause switch owned by one account. Every mutating operation in
//! the ledger must first obtain a [`Live`] token from the gate; component
//! mutators take that token as a parameter, so an ungated mutation does not
//! type-check. Pure reads never need a token.

use serde::{Deserialize, Serialize};
use surety_common::{AccountId, Result, SuretyError};
use tracing::info;

/// Process-wide operating status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalGate {
    owner: AccountId,
    operational: bool,
}

/// Proof that the gate was open when the current operation started
#[derive(Debug, Clone, Copy)]
pub struct Live<'g> {
    _gate: &'g OperationalGate,
}

impl OperationalGate {
    /// New gate, operational by default
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            operational: true,
        }
    }

    pub(crate) fn restore(owner: AccountId, operational: bool) -> Self {
        Self { owner, operational }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    /// Pause or resume the ledger
    ///
    /// Owner-only, and deliberately not gated itself so a paused ledger can
    /// be resumed. Returns whether the flag changed.
    pub fn set_operational(&mut self, caller: &AccountId, mode: bool) -> Result<bool> {
        self.ensure_owner(caller)?;

        let changed = self.operational != mode;
        self.operational = mode;

        if changed {
            info!(operational = mode, "Operating status changed");
        }
        Ok(changed)
    }

    /// Fail with `SystemPaused` unless operational
    pub fn live(&self) -> Result<Live<'_>> {
        if !self.operational {
            return Err(SuretyError::SystemPaused);
        }
        Ok(Live { _gate: self })
    }

    /// Fail with `Unauthorized` unless `caller` is the owner
    pub fn ensure_owner(&self, caller: &AccountId) -> Result<()> {
        if *caller != self.owner {
            return Err(SuretyError::Unauthorized);
        }
        Ok(())
    }
}
