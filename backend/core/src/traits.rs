use async_trait::async_trait;

use crate::error::VisionError;
use crate::types::EncodedImagePayload;

/// Trait for vision-capable chat-completion providers used by the inference client.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send one user message made of a text part and an image part.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, VisionError>;
}

/// Request to a vision provider.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub prompt: String,
    pub image: EncodedImagePayload,
    pub max_tokens: u32,
}

/// Response from a vision provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
