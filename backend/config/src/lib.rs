//! `finsight-config`: finsight runtime configuration.
//!
//! Provides:
//! - Typed settings read from environment variables, with defaults
//! - Credential resolution: environment first, then the secrets file
//! - A redacting `ApiKey` wrapper so the secret never reaches a log line

pub mod secrets;
pub mod settings;

use std::path::PathBuf;

pub use secrets::{ApiKey, CredentialSource, Credentials, API_KEY_VAR};
pub use settings::{AppConfig, SpeechBackend};

/// Configuration errors. All of them are fatal at start-up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "missing API key: set {var} in the environment or in the secrets file {}",
        secrets_path.display()
    )]
    MissingApiKey { var: String, secrets_path: PathBuf },

    #[error("could not read secrets file {}: {reason}", path.display())]
    SecretsFile { path: PathBuf, reason: String },

    #[error("invalid value for {var}: \"{value}\" ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}
