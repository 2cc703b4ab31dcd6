use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use finsight_core::{VisionError, VisionProvider, VisionRequest, VisionResponse};

/// A mock vision provider that returns canned responses and records every call.
///
/// Scripted replies are consumed first, in order; after that the fixed reply
/// is returned.
pub struct MockVisionProvider {
    name: String,
    fixed: Result<String, VisionError>,
    script: Mutex<VecDeque<Result<String, VisionError>>>,
    requests: Mutex<Vec<VisionRequest>>,
}

impl MockVisionProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: Ok("Mock response".to_string()),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed = Ok(response.into());
        self
    }

    /// Fail every unscripted call with `error`.
    pub fn failing(mut self, error: VisionError) -> Self {
        self.fixed = Err(error);
        self
    }

    pub fn with_script<I>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, VisionError>>,
    {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(replies);
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Prompt text of every call, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, VisionError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fixed.clone());

        reply.map(|content| VisionResponse {
            content,
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
