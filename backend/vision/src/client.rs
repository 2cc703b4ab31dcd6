//! Inference client: one remote call per prompt, each bundling the prompt with
//! the encoded image.

use std::sync::Arc;

use tracing::{info, warn};

use finsight_core::{AnalysisPrompt, EncodedImagePayload, PromptOutcome, VisionProvider, VisionRequest};
use finsight_logging::redact_sensitive_data;

/// Issues analysis requests against a vision provider.
///
/// Calls are never cached and never retried: the same image analyzed twice
/// costs two full round trips per prompt.
#[derive(Clone)]
pub struct InferenceClient {
    provider: Arc<dyn VisionProvider>,
    model: String,
}

impl InferenceClient {
    pub fn new(provider: Arc<dyn VisionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a single prompt. Provider failures land in the outcome, they are not
    /// returned as errors.
    pub async fn run_prompt(
        &self,
        payload: &EncodedImagePayload,
        prompt: &AnalysisPrompt,
    ) -> PromptOutcome {
        let request = VisionRequest {
            model: self.model.clone(),
            prompt: prompt.text.to_string(),
            image: payload.clone(),
            max_tokens: prompt.max_tokens,
        };

        let result = match self.provider.complete(&request).await {
            Ok(response) => {
                info!(
                    provider = %response.provider,
                    model = %response.model,
                    purpose = %prompt.purpose,
                    tokens = response.tokens_used,
                    latency_ms = response.latency_ms,
                    "Vision call completed"
                );
                Ok(response.content)
            }
            Err(err) => {
                warn!(
                    provider = %self.provider.name(),
                    purpose = %prompt.purpose,
                    error = %redact_sensitive_data(&err.to_string()),
                    "Vision call failed"
                );
                Err(err)
            }
        };

        PromptOutcome {
            purpose: prompt.purpose,
            result,
        }
    }

    /// Run every prompt in order, one after another. A failed call does not
    /// stop the ones after it.
    pub async fn analyze(
        &self,
        payload: &EncodedImagePayload,
        prompts: &[AnalysisPrompt],
    ) -> Vec<PromptOutcome> {
        let mut outcomes = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            outcomes.push(self.run_prompt(payload, prompt).await);
        }
        outcomes
    }
}
