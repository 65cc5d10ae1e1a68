//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", render_all(.0))]
    Validation(Vec<ValidationError>),
}

fn render_all(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load a TOML config file and validate it.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&raw)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
