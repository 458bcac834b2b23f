/// Persisted auth token and remembered-credentials blob
pub mod credentials;

/// Remote service endpoint configuration from config.toml and environment
pub mod service;
