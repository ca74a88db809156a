//! Surety Oracle Simulator
//!
//! Boots an in-process ledger, registers a fleet of oracles, and answers
//! every status request with a random status code from each oracle holding
//! the requested index.

mod config;
mod responder;
mod scenario;

use anyhow::Result;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use surety_ledger::{SuretyConfig, SuretyLedger};

use crate::config::OracleSimConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Starting Surety oracle simulator v{}", surety_common::VERSION);

    // Optional settings file as the first argument
    let path = std::env::args().nth(1);
    let cfg = OracleSimConfig::load(path.as_deref().map(Path::new))?;
    info!("Loaded configuration: {:?}", cfg);

    let ledger_config = SuretyConfig::load(cfg.ledger_config.as_deref().map(Path::new))?;
    let ledger = SuretyLedger::with_system_clock(ledger_config)?;

    let summary = scenario::run(ledger, &cfg).await?;
    info!(
        requests = summary.stats.requests,
        finalized = summary.stats.finalized,
        accepted = summary.stats.accepted,
        rejected = summary.stats.rejected,
        payouts = summary.payouts.len(),
        "Done"
    );
    for (flight, status) in &summary.statuses {
        info!(flight = %flight, status = %status, "Final flight status");
    }

    Ok(())
}
