//! Remote service configuration loading from config.toml
//!
//! This module provides functionality to load the remote data service
//! endpoint configuration from a TOML configuration file, with environment
//! variables taking precedence so deployments can override the file without
//! editing it.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configured base URL.
const ENV_BASE_URL: &str = "PLANBOOK_API_URL";
/// Environment variable overriding the configured bearer token.
const ENV_TOKEN: &str = "PLANBOOK_API_TOKEN";

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Remote data service settings
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Connection settings of the remote data service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the data service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token, usually supplied via the credentials blob or env
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Applies `PLANBOOK_API_URL` and `PLANBOOK_API_TOKEN` overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            self.token = Some(token);
        }
        self
    }
}

/// Loads service configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads service configuration from the default location (./config.toml),
/// falling back to built-in defaults when the file does not exist. A .env
/// file is loaded first (non-fatal if absent), then env overrides are
/// applied either way.
pub fn load_default_config() -> Result<ServiceConfig> {
    dotenvy::dotenv().ok();
    let service = if Path::new("config.toml").exists() {
        load_config("config.toml")?.service
    } else {
        ServiceConfig::default()
    };
    Ok(service.with_env_overrides())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_service_config() {
        let toml_str = r#"
            [service]
            base_url = "https://plans.example.com/api"
            request_timeout_secs = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.base_url, "https://plans.example.com/api");
        assert_eq!(config.service.request_timeout_secs, 10);
        assert!(config.service.token.is_none());
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.service.base_url, default_base_url());
        assert_eq!(config.service.request_timeout_secs, 30);
    }
}
