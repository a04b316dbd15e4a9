use clap::{Parser, Subcommand};
use std::path::PathBuf;

use thinq_types::AppConfig;

#[derive(Parser)]
#[command(
    name = "thinq-server",
    about = "ThinQ Bridge - todo relay and character API for the desk device",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "THINQ_PORT", help = "Override the configured listen port")]
    pub port: Option<u16>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "THINQ_DATA_DIR", help = "Directory holding thinq_config.json")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "THINQ_DEVICE_ENDPOINT", help = "Device URL receiving todo changes")]
    pub device_endpoint: Option<String>,

    #[arg(long, help = "Do not start the relay automatically")]
    pub no_auto_start: bool,
}

impl Cli {
    /// Fold command-line and environment overrides into the file config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.store.database_url = Some(url.clone());
        }
        if let Some(endpoint) = &self.device_endpoint {
            config.relay.endpoint.clone_from(endpoint);
        }
        if self.no_auto_start {
            config.server.auto_start_relay = false;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default if no command specified)")]
    Serve,

    #[command(subcommand, about = "View or change configuration")]
    Config(ConfigCommands),

    #[command(about = "Send a test action to the device endpoint")]
    Ping,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the effective configuration")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Print the config file location")]
    Path,

    #[command(about = "Set one value in the config file (e.g. relay.max_attempts 3)")]
    Set {
        #[arg(help = "Dotted key, section.field")]
        key: String,
        value: String,
    },
}
