//! Ledger configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use surety_common::{
    AccountId, Amount, Result, SuretyError, CONSENSUS_THRESHOLD, INDEXES_PER_ORACLE,
    INSURANCE_PAY_LIMIT, MIN_RESPONSES, ORACLE_INDEX_SPACE, PARTICIPATION_FUND,
    REGISTRATION_FEE,
};

/// Environment prefix for configuration overrides (`SURETY_MIN_RESPONSES=5`)
pub const ENV_PREFIX: &str = "SURETY";

/// Journal entries kept in memory before the oldest are dropped
pub const DEFAULT_JOURNAL_RETENTION: usize = 10_000;

/// When a settled flight pays its insurees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutPolicy {
    /// Credit every policy on first settlement, whatever the status
    #[default]
    Unconditional,
    /// Credit only once the flight status is `LateAirline`
    AirlineDelayOnly,
}

/// Surety ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuretyConfig {
    /// Account allowed to pause and resume the ledger
    pub owner: AccountId,
    /// Airline registered at genesis
    pub first_airline: AccountId,
    /// Exact contribution that makes an airline funded
    pub participation_fund: Amount,
    /// Cumulative insurance cap per passenger per flight
    pub insurance_pay_limit: Amount,
    /// Fee an oracle pays to register
    pub registration_fee: Amount,
    /// Agreeing responses that finalise a status request
    pub min_responses: usize,
    /// Registered-airline count at which admission requires votes
    pub consensus_threshold: usize,
    /// Oracle indices are drawn from `0..oracle_index_space`
    pub oracle_index_space: u8,
    /// Settlement policy for credited flights
    pub payout_policy: PayoutPolicy,
    /// Seed for oracle index selection; entropy when absent
    pub rng_seed: Option<u64>,
    /// Most recent journal entries held in memory
    pub journal_retention: usize,
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            owner: AccountId::derive("surety-owner"),
            first_airline: AccountId::derive("surety-first-airline"),
            participation_fund: PARTICIPATION_FUND,
            insurance_pay_limit: INSURANCE_PAY_LIMIT,
            registration_fee: REGISTRATION_FEE,
            min_responses: MIN_RESPONSES,
            consensus_threshold: CONSENSUS_THRESHOLD,
            oracle_index_space: ORACLE_INDEX_SPACE,
            payout_policy: PayoutPolicy::default(),
            rng_seed: None,
            journal_retention: DEFAULT_JOURNAL_RETENTION,
        }
    }
}

impl SuretyConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Later sources win: defaults, then the file, then `SURETY_*`
    /// variables (also read from a `.env` file when present).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let cfg: SuretyConfig = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| SuretyError::Config(e.to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the ledger cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.owner == AccountId::ZERO {
            return Err(SuretyError::Config("owner must not be the zero address".into()));
        }
        if self.participation_fund.is_zero() {
            return Err(SuretyError::Config("participation_fund must be positive".into()));
        }
        if self.insurance_pay_limit.is_zero() {
            return Err(SuretyError::Config("insurance_pay_limit must be positive".into()));
        }
        if self.min_responses == 0 {
            return Err(SuretyError::Config("min_responses must be at least 1".into()));
        }
        if self.consensus_threshold == 0 {
            return Err(SuretyError::Config("consensus_threshold must be at least 1".into()));
        }
        if (self.oracle_index_space as usize) < INDEXES_PER_ORACLE {
            return Err(SuretyError::Config(format!(
                "oracle_index_space must hold at least {} distinct indices",
                INDEXES_PER_ORACLE
            )));
        }
        if self.journal_retention == 0 {
            return Err(SuretyError::Config("journal_retention must be at least 1".into()));
        }
        Ok(())
    }
}
