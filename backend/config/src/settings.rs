use std::path::PathBuf;
use std::str::FromStr;

use finsight_core::{AnalysisProfile, TriggerPolicy};

use crate::ConfigError;

/// Which speech-synthesis service renders the spoken summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechBackend {
    /// OpenAI `/audio/speech`, sharing the inference credential.
    OpenAi,
    /// Google Translate speech endpoint, no credential.
    Google,
}

impl FromStr for SpeechBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "google" | "gtts" => Ok(Self::Google),
            other => Err(format!("unknown speech backend \"{other}\"")),
        }
    }
}

/// finsight runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// Directory of the rolling NDJSON log
    pub log_dir: PathBuf,
    /// Vision model identifier
    pub model: String,
    /// Base URL of the chat-completion API
    pub api_base: String,
    pub profile: AnalysisProfile,
    pub trigger: TriggerPolicy,
    pub speech_backend: SpeechBackend,
    /// Fixed language code handed to speech synthesis
    pub speech_language: String,
    /// Where temporary audio artifacts are written
    pub audio_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub jpeg_quality: u8,
    /// TOML file consulted when the API key is not in the environment
    pub secrets_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let profile = AnalysisProfile::default();
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8501,
            log_level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            profile,
            trigger: profile.default_trigger(),
            speech_backend: SpeechBackend::OpenAi,
            speech_language: "en".to_string(),
            audio_dir: std::env::temp_dir(),
            max_upload_bytes: 20 * 1024 * 1024,
            jpeg_quality: 85,
            secrets_path: PathBuf::from(".finsight/secrets.toml"),
        }
    }
}

fn parse<T>(var: &str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var: var.to_string(),
        value,
        reason: e.to_string(),
    })
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using a provided lookup (useful for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let profile = match var("FINSIGHT_PROFILE") {
            Some(v) => parse("FINSIGHT_PROFILE", v)?,
            None => defaults.profile,
        };
        let trigger = match var("FINSIGHT_TRIGGER") {
            Some(v) => parse("FINSIGHT_TRIGGER", v)?,
            None => profile.default_trigger(),
        };
        let jpeg_quality: u8 = match var("FINSIGHT_JPEG_QUALITY") {
            Some(v) => parse("FINSIGHT_JPEG_QUALITY", v)?,
            None => defaults.jpeg_quality,
        };
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                var: "FINSIGHT_JPEG_QUALITY".to_string(),
                value: jpeg_quality.to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(Self {
            bind_address: var("FINSIGHT_BIND").unwrap_or(defaults.bind_address),
            port: match var("FINSIGHT_PORT") {
                Some(v) => parse("FINSIGHT_PORT", v)?,
                None => defaults.port,
            },
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: var("FINSIGHT_LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            model: var("FINSIGHT_MODEL").unwrap_or(defaults.model),
            api_base: var("FINSIGHT_API_BASE").unwrap_or(defaults.api_base),
            profile,
            trigger,
            speech_backend: match var("FINSIGHT_TTS") {
                Some(v) => parse("FINSIGHT_TTS", v)?,
                None => defaults.speech_backend,
            },
            speech_language: var("FINSIGHT_TTS_LANGUAGE").unwrap_or(defaults.speech_language),
            audio_dir: var("FINSIGHT_AUDIO_DIR").map(PathBuf::from).unwrap_or(defaults.audio_dir),
            max_upload_bytes: match var("FINSIGHT_MAX_UPLOAD_BYTES") {
                Some(v) => parse("FINSIGHT_MAX_UPLOAD_BYTES", v)?,
                None => defaults.max_upload_bytes,
            },
            jpeg_quality,
            secrets_path: var("FINSIGHT_SECRETS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8501);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.profile, AnalysisProfile::Enhanced);
        assert_eq!(config.trigger, TriggerPolicy::Automatic);
        assert_eq!(config.speech_backend, SpeechBackend::OpenAi);
        assert_eq!(config.speech_language, "en");
    }

    #[test]
    fn simple_profile_defaults_to_manual_trigger() {
        let config = AppConfig::from_lookup(lookup(&[("FINSIGHT_PROFILE", "simple")])).unwrap();
        assert_eq!(config.trigger, TriggerPolicy::Manual);
    }

    #[test]
    fn trigger_overrides_profile_default() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FINSIGHT_PROFILE", "simple"),
            ("FINSIGHT_TRIGGER", "automatic"),
            ("FINSIGHT_PORT", "9000"),
            ("FINSIGHT_TTS", "google"),
        ]))
        .unwrap();
        assert_eq!(config.trigger, TriggerPolicy::Automatic);
        assert_eq!(config.port, 9000);
        assert_eq!(config.speech_backend, SpeechBackend::Google);
    }

    #[test]
    fn rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup(&[("FINSIGHT_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("FINSIGHT_PORT"));

        let err = AppConfig::from_lookup(lookup(&[("FINSIGHT_JPEG_QUALITY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
