//! Simulator configuration

use anyhow::{ensure, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment prefix for simulator settings (`SURETY_ORACLE_ORACLE_COUNT=30`)
pub const ENV_PREFIX: &str = "SURETY_ORACLE";

/// Oracle simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSimConfig {
    /// Number of simulated oracles
    pub oracle_count: usize,
    /// Airlines brought into the ledger, genesis included
    pub airline_count: usize,
    /// Passengers buying insurance, spread over the flights
    pub passenger_count: usize,
    /// Premium each passenger pays, in whole units
    pub premium: Decimal,
    /// Fetch rounds; each round asks for the status of every flight
    pub rounds: usize,
    /// Seed for the responders' status choices; entropy when absent
    pub seed: Option<u64>,
    /// Ledger settings file
    pub ledger_config: Option<String>,
}

impl Default for OracleSimConfig {
    fn default() -> Self {
        Self {
            oracle_count: 20,
            airline_count: 5,
            passenger_count: 10,
            premium: Decimal::new(5, 1),
            rounds: 2,
            seed: None,
            ledger_config: None,
        }
    }
}

impl OracleSimConfig {
    /// Load from an optional file, then `SURETY_ORACLE_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let cfg: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .context("Failed to load oracle simulator configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.oracle_count > 0, "oracle_count must be positive");
        ensure!(self.airline_count > 0, "airline_count must be positive");
        ensure!(self.premium > Decimal::ZERO, "premium must be positive");
        Ok(())
    }
}
