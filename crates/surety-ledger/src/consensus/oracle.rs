//! Oracle registration and index assignment

use crate::gate::Live;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use surety_common::{AccountId, Amount, OracleError, Result, INDEXES_PER_ORACLE};
use tracing::info;

/// Indices held by one oracle
pub type OracleIndexes = [u8; INDEXES_PER_ORACLE];

/// Registered oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    pub account: AccountId,
    pub indexes: OracleIndexes,
}

impl Oracle {
    pub fn holds(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

#[derive(Debug)]
pub struct OracleRegistry {
    oracles: HashMap<AccountId, Oracle>,
    registration_fee: Amount,
    index_space: u8,
}

impl OracleRegistry {
    pub fn new(registration_fee: Amount, index_space: u8) -> Self {
        Self {
            oracles: HashMap::new(),
            registration_fee,
            index_space,
        }
    }

    pub(crate) fn restore(oracles: Vec<Oracle>, registration_fee: Amount, index_space: u8) -> Self {
        Self {
            oracles: oracles.into_iter().map(|o| (o.account, o)).collect(),
            registration_fee,
            index_space,
        }
    }

    /// Register `caller` as an oracle, assigning three distinct indices
    ///
    /// The fee must match the registration fee exactly.
    pub fn register_oracle<R: Rng + ?Sized>(
        &mut self,
        _live: Live<'_>,
        caller: AccountId,
        fee_paid: Amount,
        rng: &mut R,
    ) -> Result<OracleIndexes> {
        if fee_paid != self.registration_fee {
            return Err(OracleError::InsufficientFee {
                paid: fee_paid,
                required: self.registration_fee,
            }
            .into());
        }
        if self.oracles.contains_key(&caller) {
            return Err(OracleError::AlreadyRegistered { oracle: caller }.into());
        }

        let indexes = self.generate_indexes(rng);
        self.oracles.insert(
            caller,
            Oracle {
                account: caller,
                indexes,
            },
        );

        info!(oracle = %caller, ?indexes, "Oracle registered");
        Ok(indexes)
    }

    /// Draw indices, redrawing on collision within the triple
    fn generate_indexes<R: Rng + ?Sized>(&self, rng: &mut R) -> OracleIndexes {
        let mut indexes = [0u8; INDEXES_PER_ORACLE];
        for slot in 0..INDEXES_PER_ORACLE {
            let mut candidate = self.random_index(rng);
            while indexes[..slot].contains(&candidate) {
                candidate = self.random_index(rng);
            }
            indexes[slot] = candidate;
        }
        indexes
    }

    /// Uniform index from the bounded index space
    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        rng.gen_range(0..self.index_space)
    }

    pub fn get_my_indexes(&self, caller: &AccountId) -> Option<OracleIndexes> {
        self.oracles.get(caller).map(|o| o.indexes)
    }

    pub fn is_oracle(&self, account: &AccountId) -> bool {
        self.oracles.contains_key(account)
    }

    pub fn holds_index(&self, account: &AccountId, index: u8) -> bool {
        self.oracles.get(account).is_some_and(|o| o.holds(index))
    }

    pub fn registration_fee(&self) -> Amount {
        self.registration_fee
    }

    pub fn index_space(&self) -> u8 {
        self.index_space
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    /// All oracles, ordered by account
    pub fn oracles(&self) -> Vec<Oracle> {
        let mut oracles: Vec<_> = self.oracles.values().cloned().collect();
        oracles.sort_by_key(|o| o.account);
        oracles
    }
}
