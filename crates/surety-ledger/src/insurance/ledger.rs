//! Insurance ledger: capped purchases, once-per-flight crediting, payouts
//!
//! Settlement is split into a pure planning step and an infallible apply
//! step so a caller can validate a settlement alongside other checks before
//! committing any of them.

use super::treasury::Treasury;
use crate::config::PayoutPolicy;
use crate::gate::Live;
use crate::registry::FlightRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use surety_common::{
    AccountId, Amount, CreditBalance, FlightKey, InsuranceError, Result, StatusCode, SuretyError,
    CREDIT_MULTIPLIER,
};
use tracing::{debug, info};

/// Cumulative insurance bought by one passenger on one flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub passenger: AccountId,
    pub flight: FlightKey,
    pub amount_paid: Amount,
}

/// Credit granted to one passenger by a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub passenger: AccountId,
    pub premium: Amount,
    pub credit: Amount,
}

/// What crediting a flight does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settlement {
    /// The flight was credited before; nothing happens
    AlreadyCredited,
    /// Payout policy does not cover this status; flight stays uncredited
    Deferred { status: StatusCode },
    /// Every policy on the flight is credited
    Credited { payouts: Vec<Payout>, total: Amount },
}

#[derive(Debug)]
pub struct InsuranceLedger {
    /// Per flight, amount paid by each passenger
    policies: HashMap<FlightKey, BTreeMap<AccountId, Amount>>,
    credits: HashMap<AccountId, CreditBalance>,
    pay_limit: Amount,
    payout_policy: PayoutPolicy,
}

impl InsuranceLedger {
    pub fn new(pay_limit: Amount, payout_policy: PayoutPolicy) -> Self {
        Self {
            policies: HashMap::new(),
            credits: HashMap::new(),
            pay_limit,
            payout_policy,
        }
    }

    pub(crate) fn restore(
        policies: Vec<Policy>,
        credits: Vec<CreditBalance>,
        pay_limit: Amount,
        payout_policy: PayoutPolicy,
    ) -> Self {
        let mut ledger = Self::new(pay_limit, payout_policy);
        for policy in policies {
            ledger
                .policies
                .entry(policy.flight)
                .or_default()
                .insert(policy.passenger, policy.amount_paid);
        }
        ledger.credits = credits.into_iter().map(|c| (c.passenger, c)).collect();
        ledger
    }

    /// Buy insurance on a registered flight
    ///
    /// The cumulative amount per passenger and flight may not exceed the pay
    /// limit; a purchase that would is rejected whole. Returns the new
    /// cumulative amount.
    pub fn buy(
        &mut self,
        _live: Live<'_>,
        flights: &FlightRegistry,
        passenger: AccountId,
        key: &FlightKey,
        amount: Amount,
    ) -> Result<Amount> {
        if amount.is_zero() {
            return Err(SuretyError::InvalidAmount);
        }
        flights.require(key)?;

        let paid = self.policy_amount(&passenger, key);
        let total = paid.checked_add(amount).ok_or(SuretyError::Overflow)?;
        if total > self.pay_limit {
            return Err(InsuranceError::InsuranceOverbought {
                paid,
                attempted: amount,
                limit: self.pay_limit,
            }
            .into());
        }

        self.policies
            .entry(key.clone())
            .or_default()
            .insert(passenger, total);

        debug!(passenger = %passenger, flight = %key, amount = %amount, total = %total, "Insurance purchased");
        Ok(total)
    }

    /// Work out what crediting `key` under `status` would do
    pub fn plan_settlement(
        &self,
        flights: &FlightRegistry,
        key: &FlightKey,
        status: StatusCode,
    ) -> Result<Settlement> {
        let flight = flights.require(key)?;
        if flight.credited {
            return Ok(Settlement::AlreadyCredited);
        }
        if self.payout_policy == PayoutPolicy::AirlineDelayOnly && !status.is_airline_fault() {
            return Ok(Settlement::Deferred { status });
        }

        let (numerator, denominator) = CREDIT_MULTIPLIER;
        let mut payouts = Vec::new();
        let mut total = Amount::ZERO;

        for (passenger, premium) in self.policies.get(key).into_iter().flatten() {
            if premium.is_zero() {
                continue;
            }
            let credit = premium
                .mul_ratio(numerator, denominator)
                .ok_or(SuretyError::Overflow)?;

            let balance = self.credits.get(passenger);
            let owed = balance.map(|b| b.owed).unwrap_or_default();
            let credited = balance.map(|b| b.total_credited).unwrap_or_default();
            owed.checked_add(credit).ok_or(SuretyError::Overflow)?;
            credited.checked_add(credit).ok_or(SuretyError::Overflow)?;

            total = total.checked_add(credit).ok_or(SuretyError::Overflow)?;
            payouts.push(Payout {
                passenger: *passenger,
                premium: *premium,
                credit,
            });
        }

        Ok(Settlement::Credited { payouts, total })
    }

    /// Apply a settlement produced by [`InsuranceLedger::plan_settlement`]
    pub fn apply_settlement(
        &mut self,
        live: Live<'_>,
        flights: &mut FlightRegistry,
        key: &FlightKey,
        settlement: &Settlement,
    ) -> Result<()> {
        let Settlement::Credited { payouts, total } = settlement else {
            return Ok(());
        };
        if !flights.mark_credited(live, key) {
            return Ok(());
        }

        for payout in payouts {
            self.credits
                .entry(payout.passenger)
                .or_insert_with(|| CreditBalance::new(payout.passenger))
                .credit(payout.credit)?;
        }

        info!(flight = %key, insurees = payouts.len(), total = %total, "Insurees credited");
        Ok(())
    }

    /// Credit every insuree of the flight, at most once per flight
    pub fn credit_insurees(
        &mut self,
        live: Live<'_>,
        flights: &mut FlightRegistry,
        key: &FlightKey,
    ) -> Result<Settlement> {
        let status = flights.view_flight_status(key);
        let settlement = self.plan_settlement(flights, key, status)?;
        self.apply_settlement(live, flights, key, &settlement)?;
        Ok(settlement)
    }

    /// Pay the passenger's whole owed balance out of the treasury
    pub fn pay(
        &mut self,
        live: Live<'_>,
        passenger: AccountId,
        treasury: &mut Treasury,
    ) -> Result<Amount> {
        let owed = self.get_insuree_credit(&passenger);
        if owed.is_zero() {
            return Err(InsuranceError::NoCreditOwed { passenger }.into());
        }
        treasury.ensure_covers(owed)?;

        let balance = self
            .credits
            .get_mut(&passenger)
            .ok_or(InsuranceError::NoCreditOwed { passenger })?;
        let amount = balance.withdraw_all()?;
        treasury.disburse(live, amount)?;

        info!(passenger = %passenger, amount = %amount, "Insuree paid");
        Ok(amount)
    }

    pub fn get_insuree_credit(&self, passenger: &AccountId) -> Amount {
        self.credits
            .get(passenger)
            .map(|c| c.owed)
            .unwrap_or_default()
    }

    pub fn credit_balance(&self, passenger: &AccountId) -> Option<&CreditBalance> {
        self.credits.get(passenger)
    }

    pub fn policy_amount(&self, passenger: &AccountId, key: &FlightKey) -> Amount {
        self.policies
            .get(key)
            .and_then(|by_passenger| by_passenger.get(passenger))
            .copied()
            .unwrap_or_default()
    }

    pub fn pay_limit(&self) -> Amount {
        self.pay_limit
    }

    pub fn payout_policy(&self) -> PayoutPolicy {
        self.payout_policy
    }

    /// All policies, ordered by flight then passenger
    pub fn policies(&self) -> Vec<Policy> {
        let mut policies: Vec<_> = self
            .policies
            .iter()
            .flat_map(|(flight, by_passenger)| {
                by_passenger.iter().map(move |(passenger, amount)| Policy {
                    passenger: *passenger,
                    flight: flight.clone(),
                    amount_paid: *amount,
                })
            })
            .collect();
        policies.sort_by(|a, b| (&a.flight, a.passenger).cmp(&(&b.flight, b.passenger)));
        policies
    }

    /// All credit balances, ordered by passenger
    pub fn credit_balances(&self) -> Vec<CreditBalance> {
        let mut credits: Vec<_> = self.credits.values().cloned().collect();
        credits.sort_by_key(|c| c.passenger);
        credits
    }
}
