use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;

use crate::engine::{TtsProvider, TtsRequest};

/// A mock TTS provider that returns fixed audio bytes and records what it was
/// asked to say.
pub struct MockTts {
    audio: Bytes,
    failure: Option<String>,
    texts: Mutex<Vec<String>>,
}

impl MockTts {
    pub fn new() -> Self {
        Self {
            audio: Bytes::from_static(b"ID3-mock-audio"),
            failure: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_audio(mut self, audio: impl Into<Bytes>) -> Self {
        self.audio = audio.into();
        self
    }

    /// Fail every call with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every text handed to `synthesize`, in order.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for MockTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtsProvider for MockTts {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req.text);
        match &self.failure {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(self.audio.clone()),
        }
    }
}
