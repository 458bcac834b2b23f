//! Persisted credentials - the only durable client-side state.
//!
//! The auth token and the small remembered-credentials blob live in one
//! JSON file under the user config directory. The cache itself is memory
//! resident and rebuilt from the remote service on reload, so nothing else
//! is ever written to disk.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Login the user asked to remember.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedLogin {
    /// Stored account name
    pub username: String,
    /// Stored password
    pub password: String,
}

/// Contents of the credentials file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Bearer token of the active session, if any
    pub token: Option<String>,
    /// Remembered login, if the user opted in
    pub remembered: Option<RememberedLogin>,
}

/// The default credentials path under the user config directory.
pub fn default_credentials_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("planbook").join("credentials.json"))
        .ok_or_else(|| Error::Config {
            message: "could not determine the user config directory".to_string(),
        })
}

/// Loads stored credentials. A missing file is not an error; it simply
/// yields the empty default.
pub fn load_credentials<P: AsRef<Path>>(path: P) -> Result<StoredCredentials> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("no credentials file at {}, starting empty", path.display());
        return Ok(StoredCredentials::default());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes stored credentials, creating parent directories as needed.
pub fn save_credentials<P: AsRef<Path>>(path: P, credentials: &StoredCredentials) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(credentials)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Removes the credentials file, e.g. on logout. Missing files are fine.
pub fn clear_credentials<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
