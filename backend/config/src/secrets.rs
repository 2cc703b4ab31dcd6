//! Credential resolution.
//!
//! The API key is looked up once at start-up, environment first, then the
//! TOML secrets file. The resolved value is passed to the providers as a
//! dependency.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ConfigError;

/// Name of the credential, both as an environment variable and as a secrets
/// file key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// A secret API key. `Debug` and `Display` never show it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Where the key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    SecretsFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: ApiKey,
    pub source: CredentialSource,
}

impl Credentials {
    /// Resolve from the process environment and `secrets_path`.
    pub fn resolve(secrets_path: &Path) -> Result<Self, ConfigError> {
        Self::resolve_with(|name| std::env::var(name).ok(), secrets_path)
    }

    /// Resolve using a provided lookup (useful for testing).
    pub fn resolve_with<F>(lookup: F, secrets_path: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            info!("Using API key from environment");
            return Ok(Self {
                api_key: ApiKey::new(key.trim()),
                source: CredentialSource::Environment,
            });
        }

        if let Some(key) = read_secret(secrets_path, API_KEY_VAR)? {
            info!(path = %secrets_path.display(), "Using API key from secrets file");
            return Ok(Self {
                api_key: ApiKey::new(key),
                source: CredentialSource::SecretsFile(secrets_path.to_path_buf()),
            });
        }

        Err(ConfigError::MissingApiKey {
            var: API_KEY_VAR.to_string(),
            secrets_path: secrets_path.to_path_buf(),
        })
    }
}

/// Read one string key from a TOML secrets file. A missing file is not an error.
fn read_secret(path: &Path, key: &str) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "No secrets file");
        return Ok(None);
    }

    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::SecretsFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let table: toml::Table = toml::from_str(&text).map_err(|e| ConfigError::SecretsFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(table
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string))
}
