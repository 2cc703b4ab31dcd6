pub mod error;
pub mod traits;
pub mod types;

pub use error::{VisionError, ACCESS_HINT, ANALYSIS_FAILED_MESSAGE};
pub use traits::{VisionProvider, VisionRequest, VisionResponse};
pub use types::{
    AnalysisProfile, AnalysisPrompt, AnalysisResult, EncodedImagePayload, PromptOutcome,
    PromptPurpose, TriggerPolicy,
};
