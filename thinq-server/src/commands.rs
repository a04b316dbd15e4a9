use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use thinq_core::config::{apply_setting, config_path, update_config};
use thinq_core::DeviceForwarder;
use thinq_types::AppConfig;

use crate::cli::ConfigCommands;

pub fn handle_config_command(cmd: ConfigCommands, data_dir: &Path, config: &AppConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => show_config(config, json),
        ConfigCommands::Path => {
            println!("{}", config_path(data_dir).display());
            Ok(())
        },
        ConfigCommands::Set { key, value } => {
            update_config(data_dir, |config| apply_setting(config, &key, &value))?;
            println!("✅ {} = {} (saved to {})", key, value, config_path(data_dir).display());
            Ok(())
        },
    }
}

fn show_config(config: &AppConfig, json: bool) -> Result<()> {
    let mut shown = config.clone();
    if shown.store.database_url.is_some() {
        shown.store.database_url = Some("***".to_string());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("ThinQ Bridge configuration");
    println!("  Listen:        {}:{}", shown.server.host, shown.server.port);
    println!(
        "  Relay:         '{}' → {} (auto-start: {})",
        shown.relay.collection, shown.relay.endpoint, shown.server.auto_start_relay
    );
    println!(
        "  Delivery:      timeout {}s, {} attempt(s), {}ms between",
        shown.relay.request_timeout_secs, shown.relay.max_attempts, shown.relay.retry_delay_ms
    );
    println!("  Cache TTL:     {}s", shown.cache.ttl_secs);
    println!(
        "  Store:         {}",
        shown.store.database_url.as_deref().map_or("in-memory", |_| "PostgreSQL")
    );
    Ok(())
}

pub async fn handle_ping(config: &AppConfig) -> Result<()> {
    let forwarder = DeviceForwarder::new(
        &config.relay.endpoint,
        Duration::from_secs(config.relay.request_timeout_secs),
    )?;
    let outcome = forwarder.ping("Test from thinq-server CLI").await?;
    println!("{} → {}", forwarder.endpoint(), outcome.status);
    if !outcome.body.is_empty() {
        println!("{}", outcome.body);
    }
    Ok(())
}
