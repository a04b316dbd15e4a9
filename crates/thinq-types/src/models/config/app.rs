//! Application-level configuration.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use super::{CacheConfig, RelayConfig, ServerConfig, StoreConfig};
use crate::error::ConfigError;

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP listener
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    /// Change-feed relay
    #[serde(default)]
    #[validate(nested)]
    pub relay: RelayConfig,
    /// Read-through caches
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,
    /// Document store
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Run all validators, reporting the first failing field.
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|errors| first_failure(&errors))
    }
}

fn first_failure(errors: &ValidationErrors) -> ConfigError {
    let mut fields: Vec<(String, String)> = Vec::new();
    collect_failures("", errors, &mut fields);
    fields.sort();
    match fields.into_iter().next() {
        Some((field, message)) => ConfigError::ValidationError { field, message },
        None => ConfigError::ValidationError {
            field: "config".to_string(),
            message: errors.to_string(),
        },
    }
}

fn collect_failures(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map_or_else(|| err.code.to_string(), ToString::to_string);
                    out.push((path.clone(), message));
                }
            },
            ValidationErrorsKind::Struct(inner) => collect_failures(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_failures(&format!("{}[{}]", path, index), inner, out);
                }
            },
        }
    }
}
