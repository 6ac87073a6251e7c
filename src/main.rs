//! # Order Intake Service
//!
//! Boots the persistence core and keeps it running until Ctrl-C:
//!
//! 1.  Load `.env` if present and set up tracing.
//! 2.  Resolve the [`ConnectionConfig`]; missing credentials exit with status 1.
//! 3.  Dial the database via [`OrderSystem::start`]; a failed dial exits with status 1.
//! 4.  Report the current order count as a readiness probe.

use anyhow::Context;
use order_intake::config::ConnectionConfig;
use order_intake::lifecycle::{setup_tracing, OrderSystem};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Setup tracing once for the entire application
    setup_tracing();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }
    info!("Starting order intake service");

    let config = match ConnectionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid database configuration, exiting");
            std::process::exit(1);
        }
    };

    let system = match OrderSystem::start(&config).await {
        Ok(system) => system,
        Err(e) => {
            error!(address = %config.address(), error = %e, "Can't connect to the database, exiting");
            std::process::exit(1);
        }
    };

    match system.order_client.get_order_count().await {
        Ok(count) => info!(order_count = count.order_count, timestamp = %count.timestamp, "Ready"),
        Err(failure) => warn!(error = %failure.error, "Initial order count failed"),
    }

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;

    system.shutdown().await;
    info!("Application completed successfully");
    Ok(())
}
