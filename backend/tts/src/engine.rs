/// TTS provider trait and implementations (OpenAI speech + Google Translate speech).
use anyhow::Result;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Audio format for TTS output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Wav,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/opus",
            Self::Wav => "audio/wav",
        }
    }

    pub fn openai_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Wav => "wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.openai_str()
    }
}

/// A TTS request.
#[derive(Debug, Clone)]
pub struct TtsRequest {
    pub text: String,
    pub voice: Option<String>,
    pub format: AudioFormat,
    pub speed: f32,
    /// Language code, honoured by providers that need one.
    pub language: String,
}

impl Default for TtsRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            voice: None,
            format: AudioFormat::Mp3,
            speed: 1.0,
            language: "en".to_string(),
        }
    }
}

/// Returns raw audio bytes.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes>;
}

// ---------------------------------------------------------------------------
// OpenAI TTS
// ---------------------------------------------------------------------------

pub struct OpenAiTts {
    api_key: String,
    model: String,
    default_voice: String,
    base_url: String,
    client: Client,
}

impl OpenAiTts {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "tts-1".to_string(),
            default_voice: "nova".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OpenAiTtsBody {
    model: String,
    input: String,
    voice: String,
    response_format: String,
    speed: f32,
}

#[async_trait]
impl TtsProvider for OpenAiTts {
    fn name(&self) -> &str {
        "openai"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        let body = OpenAiTtsBody {
            model: self.model.clone(),
            input: req.text,
            voice: req.voice.unwrap_or_else(|| self.default_voice.clone()),
            response_format: req.format.openai_str().to_string(),
            speed: req.speed,
        };
        info!("[TTS/OpenAI] Synthesizing with model={}", body.model);
        let bytes = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// Google Translate TTS
// ---------------------------------------------------------------------------

/// Longest text the Google Translate speech endpoint accepts per request.
pub const GOOGLE_CHUNK_CHARS: usize = 100;

/// Google Translate speech endpoint. MP3 only; voice and speed are ignored.
pub struct GoogleTranslateTts {
    base_url: String,
    client: Client,
}

impl GoogleTranslateTts {
    pub fn new() -> Self {
        Self {
            base_url: "https://translate.google.com".to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for GoogleTranslateTts {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text into pieces of at most `max_chars` characters, breaking at
/// whitespace. A single word longer than the limit is cut mid-word.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl TtsProvider for GoogleTranslateTts {
    fn name(&self) -> &str {
        "google"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        let chunks = split_for_speech(&req.text, GOOGLE_CHUNK_CHARS);
        let total = chunks.len().to_string();
        info!(
            "[TTS/Google] Synthesizing {} chunk(s) lang={}",
            chunks.len(),
            req.language
        );

        let mut audio = BytesMut::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let bytes = self
                .client
                .get(format!("{}/translate_tts", self.base_url))
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", req.language.as_str()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio.freeze())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

pub enum TtsProviderKind {
    OpenAi { api_key: String, base_url: String },
    Google,
}

pub fn create_tts(kind: TtsProviderKind) -> Box<dyn TtsProvider> {
    match kind {
        TtsProviderKind::OpenAi { api_key, base_url } => {
            Box::new(OpenAiTts::new(api_key).with_base_url(base_url))
        }
        TtsProviderKind::Google => Box::new(GoogleTranslateTts::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn splits_at_word_boundaries() {
        let chunks = split_for_speech("Clownfish, a small orange reef fish.", 16);
        assert_eq!(chunks, vec!["Clownfish, a", "small orange", "reef fish."]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 16));
    }

    #[test]
    fn cuts_overlong_words() {
        let chunks = split_for_speech("abcdefghij xy", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_for_speech("   ", 100).is_empty());
    }

    #[test]
    fn factory_picks_provider() {
        let google = create_tts(TtsProviderKind::Google);
        assert_eq!(google.name(), "google");
        let openai = create_tts(TtsProviderKind::OpenAi {
            api_key: "sk-test".into(),
            base_url: "http://localhost".into(),
        });
        assert_eq!(openai.name(), "openai");
    }

    #[tokio::test]
    async fn openai_posts_speech_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/speech")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "tts-1",
                "input": "Clownfish.",
                "voice": "nova",
                "response_format": "mp3"
            })))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"ID3fake")
            .create_async()
            .await;

        let tts = OpenAiTts::new("sk-test".into()).with_base_url(server.url());
        let audio = tts
            .synthesize(TtsRequest {
                text: "Clownfish.".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(&audio[..], b"ID3fake");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn openai_error_status_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/audio/speech")
            .with_status(500)
            .create_async()
            .await;

        let tts = OpenAiTts::new("sk-test".into()).with_base_url(server.url());
        let result = tts
            .synthesize(TtsRequest {
                text: "Clownfish.".into(),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn google_concatenates_chunks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/translate_tts")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("tl".into(), "en".into()),
                Matcher::UrlEncoded("client".into(), "tw-ob".into()),
                Matcher::UrlEncoded("total".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(b"mp3")
            .expect(2)
            .create_async()
            .await;

        let text = format!("{} {}", "a".repeat(60), "b".repeat(60));
        let tts = GoogleTranslateTts::new().with_base_url(server.url());
        let audio = tts
            .synthesize(TtsRequest {
                text,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(&audio[..], b"mp3mp3");
        mock.assert_async().await;
    }
}
