//! VIEWDECK — local dashboard for simulated tab view sessions.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! and serves the dashboard until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use viewdeck::config::AppConfig;
use viewdeck::dashboard;
use viewdeck::dashboard::routes::DashboardState;
use viewdeck::types::AccrualMode;

/// Overrides `simulation.accrual` from the config file.
const ACCRUAL_ENV: &str = "VIEWDECK_ACCRUAL";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let mut cfg = AppConfig::load_or_default()?;
    if let Ok(raw) = std::env::var(ACCRUAL_ENV) {
        match raw.parse::<AccrualMode>() {
            Ok(mode) => cfg.simulation.accrual = mode,
            Err(e) => warn!(error = %e, "Ignoring {ACCRUAL_ENV}"),
        }
    }

    info!(
        addr = %cfg.bind_addr(),
        tick_interval_ms = cfg.simulation.tick_interval_ms,
        max_tabs = cfg.simulation.max_tabs,
        accrual = ?cfg.simulation.accrual,
        "VIEWDECK starting up"
    );

    let state = Arc::new(DashboardState::new(cfg.simulation.clone()));
    dashboard::serve(state, &cfg.bind_addr(), shutdown_signal()).await?;

    info!("VIEWDECK shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("viewdeck=info"));

    let json_logging = std::env::var("VIEWDECK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
