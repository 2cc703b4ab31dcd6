use thiserror::Error;

/// Generic text shown to the user for any failed inference call.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Error occurred while analyzing the image. Please try again.";

/// Hint shown next to an inference failure.
pub const ACCESS_HINT: &str =
    "Please make sure you have access to a vision-capable model in your OpenAI account";

/// Failure of a single call to the vision-capable chat-completion API.
///
/// Every variant is recoverable for the analysis cycle: it is rendered as an
/// error string, never escalated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VisionError {
    #[error("authorization rejected by provider: {0}")]
    Unauthorized(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("provider quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request rejected as malformed: {0}")]
    BadRequest(String),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl VisionError {
    /// The generic message every inference failure collapses to.
    pub fn user_message(&self) -> &'static str {
        ANALYSIS_FAILED_MESSAGE
    }

    /// Classify an HTTP error status and body into a variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(body),
            429 if body.contains("insufficient_quota") => Self::QuotaExceeded(body),
            429 => Self::RateLimited(body),
            400 | 404 | 413 | 422 => Self::BadRequest(body),
            408 | 504 => Self::Timeout(body),
            _ => Self::Api { status, body },
        }
    }
}
