//! Speech renderer: text in, playable clip out, temporary artifact gone.
//!
//! The synthesized audio is written to a temporary file whose write handle is
//! closed before the player sees it. The player returns only once the clip is
//! fully loaded and its read handle released; the file is deleted right after,
//! on success and on every error path alike.
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{AudioFormat, TtsProvider, TtsRequest};

/// Audio loaded into memory and ready for the output surface.
#[derive(Debug, Clone)]
pub struct PlaybackClip {
    pub audio: Bytes,
    pub mime_type: &'static str,
    /// The artifact the clip was loaded from. It no longer exists once
    /// `SpeechRenderer::render` has returned.
    pub source_path: PathBuf,
}

impl PlaybackClip {
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.audio)
        )
    }
}

/// The playback side of the handoff.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Load the closed artifact at `path`. Returning, with success or error,
    /// means the player holds no handle on the file any more.
    async fn load(&self, path: &Path, format: AudioFormat) -> anyhow::Result<PlaybackClip>;
}

/// Reads the whole artifact into memory so the page can embed it.
pub struct InlineAudioPlayer;

#[async_trait]
impl AudioPlayer for InlineAudioPlayer {
    async fn load(&self, path: &Path, format: AudioFormat) -> anyhow::Result<PlaybackClip> {
        let audio = tokio::fs::read(path).await?;
        Ok(PlaybackClip {
            audio: Bytes::from(audio),
            mime_type: format.mime_type(),
            source_path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("nothing to speak")]
    EmptyText,

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("could not write audio artifact: {0}")]
    Artifact(#[from] io::Error),

    #[error("audio playback failed: {0}")]
    Playback(String),
}

pub struct SpeechRenderer {
    provider: Arc<dyn TtsProvider>,
    player: Arc<dyn AudioPlayer>,
    scratch_dir: PathBuf,
    language: String,
    format: AudioFormat,
}

impl SpeechRenderer {
    pub fn new(
        provider: Arc<dyn TtsProvider>,
        player: Arc<dyn AudioPlayer>,
        scratch_dir: impl Into<PathBuf>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            player,
            scratch_dir: scratch_dir.into(),
            language: language.into(),
            format: AudioFormat::Mp3,
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Synthesize `text` and load it for playback.
    pub async fn render(&self, text: &str) -> Result<PlaybackClip, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let request = TtsRequest {
            text: text.to_string(),
            format: self.format,
            language: self.language.clone(),
            ..Default::default()
        };
        let audio = self
            .provider
            .synthesize(request)
            .await
            .map_err(|e| SpeechError::Synthesis(format!("{e:#}")))?;

        let artifact = self.write_artifact(audio).await?;
        let loaded = self.player.load(&artifact, self.format).await;
        release(artifact);

        let clip = loaded.map_err(|e| SpeechError::Playback(format!("{e:#}")))?;
        info!(
            provider = %self.provider.name(),
            bytes = clip.audio.len(),
            "Speech clip ready"
        );
        Ok(clip)
    }

    async fn write_artifact(&self, audio: Bytes) -> Result<TempPath, SpeechError> {
        let dir = self.scratch_dir.clone();
        let suffix = format!(".{}", self.format.extension());
        let path = tokio::task::spawn_blocking(move || -> io::Result<TempPath> {
            let mut file = tempfile::Builder::new()
                .prefix("finsight-speech-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&audio)?;
            file.flush()?;
            // Closes the write handle, keeps the path.
            Ok(file.into_temp_path())
        })
        .await
        .map_err(io::Error::other)??;
        debug!(path = %path.display(), "Wrote speech artifact");
        Ok(path)
    }
}

/// Best-effort delete. Failures are swallowed.
fn release(artifact: TempPath) {
    let shown = artifact.display().to_string();
    if let Err(e) = artifact.close() {
        debug!(path = %shown, error = %e, "Could not remove speech artifact");
    }
}
