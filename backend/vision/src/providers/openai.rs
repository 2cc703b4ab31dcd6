use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use finsight_core::{VisionError, VisionProvider, VisionRequest, VisionResponse};

/// OpenAI chat-completions provider with mixed text and image content.
///
/// Any endpoint speaking the same wire format works via `with_base_url`.
pub struct OpenAiVisionProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiVisionProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn classify_transport(err: reqwest::Error) -> VisionError {
    if err.is_timeout() {
        VisionError::Timeout(err.to_string())
    } else if err.is_decode() {
        VisionError::MalformedResponse(err.to_string())
    } else {
        VisionError::Network(err.to_string())
    }
}

#[async_trait]
impl VisionProvider for OpenAiVisionProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, VisionError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_uri(),
                        },
                    },
                ],
            }],
            max_tokens: request.max_tokens,
        };

        debug!(
            model = %request.model,
            max_tokens = request.max_tokens,
            "Sending vision request to OpenAI"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(VisionError::from_status(status.as_u16(), error_body));
        }

        let chat_response: ChatResponse = response.json().await.map_err(classify_transport)?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| VisionError::MalformedResponse("no completion text in response".into()))?;

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(VisionResponse {
            content,
            provider: "openai".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
