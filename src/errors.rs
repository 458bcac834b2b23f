//! Unified error types and result handling.
//!
//! The taxonomy separates field-level validation (rejected before any remote
//! call), business-rule rejections (a locked ledger day), remote-service
//! failures (surfaced with the payload message when the service provides
//! one), and ambient I/O, config and serialization errors.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Field-level validation failure. Never sent to the remote service.
    #[error("Validation failed for `{field}`: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// The daily ledger for a past (or future) day is read-only.
    /// Distinct from `Validation` so callers can offer a specific
    /// "not editable" affordance.
    #[error("Ledger entries for {date} are locked; only today's entries can be changed")]
    LedgerLocked {
        /// Calendar day of the rejected edit
        date: NaiveDate,
    },

    /// An entity referenced by id does not exist in the store or remotely.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "plan", "plan item"
        entity: &'static str,
        /// The missing id
        id: i64,
    },

    /// The remote data service rejected or failed a request. The message is
    /// taken verbatim from the response payload when present.
    #[error("Remote service error: {message}")]
    Remote {
        /// HTTP status when the failure carried one
        status: Option<u16>,
        /// Payload message, or a generic fallback
        message: String,
    },

    /// Non-finite amounts are rejected before they can poison aggregates.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected value
        amount: f64,
    },

    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
