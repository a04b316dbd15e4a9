//! Config file loading and saving.

use std::fs;
use std::path::{Path, PathBuf};

use thinq_types::{AppConfig, ConfigError};

const DATA_DIR: &str = ".thinq_bridge";
const CONFIG_FILE: &str = "thinq_config.json";

/// Get data directory path.
///
/// Priority:
/// 1. explicit `override_dir` (CLI `--data-dir`)
/// 2. `THINQ_DATA_DIR` environment variable (for container deployments)
/// 3. `~/.thinq_bridge`
pub fn get_data_dir(override_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let data_dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::var("THINQ_DATA_DIR") {
            Ok(custom_dir) => PathBuf::from(custom_dir),
            Err(_) => dirs::home_dir()
                .ok_or_else(|| ConfigError::DataDir {
                    message: "Cannot get home directory".to_string(),
                })?
                .join(DATA_DIR),
        },
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| ConfigError::DataDir {
            message: format!("Failed to create data directory: {}", e),
        })?;
    }

    Ok(data_dir)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load and validate the config in `data_dir`; defaults when the file is absent.
pub fn load_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = config_path(data_dir);
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let config: AppConfig = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to parse {}: {}", path.display(), e),
    })?;
    config.validate_all()?;
    Ok(config)
}

/// Save the config atomically (temp file + rename).
pub fn save_config(data_dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    config.validate_all()?;

    let path = config_path(data_dir);
    let temp_path = data_dir.join(format!("{}.tmp", CONFIG_FILE));
    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to serialize config: {}", e),
    })?;

    fs::write(&temp_path, content).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to write temp config: {}", e),
    })?;
    fs::rename(&temp_path, &path).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to save config: {}", e),
    })
}

/// Update specific fields in the config. Nothing is written if `updater`
/// or validation fails.
pub fn update_config<F>(data_dir: &Path, updater: F) -> Result<AppConfig, ConfigError>
where
    F: FnOnce(&mut AppConfig) -> Result<(), ConfigError>,
{
    let mut config = load_config(data_dir)?;
    updater(&mut config)?;
    save_config(data_dir, &config)?;
    Ok(config)
}

/// Keys accepted by [`apply_setting`].
pub const SETTABLE_KEYS: &[&str] = &[
    "server.host",
    "server.port",
    "server.auto_start_relay",
    "server.auto_start_delay_ms",
    "relay.collection",
    "relay.endpoint",
    "relay.request_timeout_secs",
    "relay.max_attempts",
    "relay.retry_delay_ms",
    "relay.failure_history",
    "cache.ttl_secs",
    "cache.titles_limit",
    "store.database_url",
    "store.max_connections",
    "store.characters_collection",
    "store.sessions_collection",
];

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::ValidationError {
        field: key.to_string(),
        message: format!("'{}': {}", value, e),
    })
}

/// Set one dotted `section.field` key from its string form.
///
/// Range checks are left to [`AppConfig::validate_all`], which runs on save.
pub fn apply_setting(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "server.host" => config.server.host = value.to_string(),
        "server.port" => config.server.port = parse_value(key, value)?,
        "server.auto_start_relay" => config.server.auto_start_relay = parse_value(key, value)?,
        "server.auto_start_delay_ms" => {
            config.server.auto_start_delay_ms = parse_value(key, value)?;
        },
        "relay.collection" => config.relay.collection = value.to_string(),
        "relay.endpoint" => config.relay.endpoint = value.to_string(),
        "relay.request_timeout_secs" => {
            config.relay.request_timeout_secs = parse_value(key, value)?;
        },
        "relay.max_attempts" => config.relay.max_attempts = parse_value(key, value)?,
        "relay.retry_delay_ms" => config.relay.retry_delay_ms = parse_value(key, value)?,
        "relay.failure_history" => config.relay.failure_history = parse_value(key, value)?,
        "cache.ttl_secs" => config.cache.ttl_secs = parse_value(key, value)?,
        "cache.titles_limit" => config.cache.titles_limit = parse_value(key, value)?,
        "store.database_url" => {
            config.store.database_url = (!value.is_empty()).then(|| value.to_string());
        },
        "store.max_connections" => config.store.max_connections = parse_value(key, value)?,
        "store.characters_collection" => config.store.characters_collection = value.to_string(),
        "store.sessions_collection" => config.store.sessions_collection = value.to_string(),
        _ => {
            return Err(ConfigError::ValidationError {
                field: key.to_string(),
                message: format!("unknown key (expected one of: {})", SETTABLE_KEYS.join(", ")),
            })
        },
    }
    Ok(())
}
