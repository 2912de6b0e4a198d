mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use slotrace_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use slotrace_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
        app.queue.clone(),
        app.stats.clone(),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = app.poller.clone();
    let poller_shutdown = shutdown_rx.clone();
    let poller_task = tokio::spawn(async move { poller.run(poller_shutdown).await });

    let heartbeat = app.heartbeat.clone();
    let heartbeat_task = tokio::spawn(async move { heartbeat.run(shutdown_rx).await });

    tracing::info!(event_name = "system.server.started", "slotrace-server started");
    wait_for_shutdown().await?;
    tracing::info!(event_name = "system.server.stopping", "slotrace-server stopping");

    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, poller_task).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            "poller did not stop within the graceful shutdown window"
        );
    }
    heartbeat_task.abort();

    app.db_pool.close().await;
    tracing::info!(event_name = "system.server.stopped", "slotrace-server stopped");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
