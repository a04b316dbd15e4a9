//! ThinQ Bridge Server - Headless Daemon
//!
//! Serves the desk device and the companion app:
//! - Relays todo changes from the document store to the device
//! - Exclusive character selection and the device's current image
//! - Cached reads for today's todo titles
//!
//! Access via: http://localhost:5000

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use thinq_types::AppConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod commands;
mod router;
mod state;
#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let data_dir = thinq_core::config::get_data_dir(cli.data_dir.as_deref())?;
    let mut config = thinq_core::config::load_config(&data_dir)?;
    cli.apply_overrides(&mut config);
    config.validate_all()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Config(cmd) => commands::handle_config_command(cmd, &data_dir, &config),
        Commands::Ping => commands::handle_ping(&config).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("🚀 ThinQ Bridge starting on port {}...", config.server.port);

    let store = state::connect_store(&config.store).await?;
    let state = AppState::new(config.clone(), store)?;

    if config.server.auto_start_relay {
        let relay = state.relay().clone();
        let delay = Duration::from_millis(config.server.auto_start_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = relay.start().await {
                warn!("⚠️ Relay auto-start failed: {}", e);
            }
        });
    }

    let app = router::build_router(state.clone());
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Listening on http://{}", addr);
    info!("📡 Relaying '{}' → {}", config.relay.collection, config.relay.endpoint);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    state.relay().stop().await;
    info!("👋 ThinQ Bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
