use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VisionError;

/// What a prompt is asked to produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PromptPurpose {
    /// Long-form markdown report under fixed section headers.
    Report,
    /// Short name-plus-description string meant to be spoken.
    SpokenSummary,
    /// Single free-form answer used by the simple profile.
    QuickCheck,
}

impl fmt::Display for PromptPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report => f.write_str("report"),
            Self::SpokenSummary => f.write_str("spoken_summary"),
            Self::QuickCheck => f.write_str("quick_check"),
        }
    }
}

/// Which variant of the analysis to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisProfile {
    /// One free-form prompt, no speech.
    Simple,
    /// Markdown report plus a spoken summary.
    #[default]
    Enhanced,
}

impl AnalysisProfile {
    /// Whether the summary is handed to the speech renderer.
    pub fn speaks(self) -> bool {
        matches!(self, Self::Enhanced)
    }

    pub fn default_trigger(self) -> TriggerPolicy {
        match self {
            Self::Simple => TriggerPolicy::Manual,
            Self::Enhanced => TriggerPolicy::Automatic,
        }
    }
}

impl FromStr for AnalysisProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "enhanced" => Ok(Self::Enhanced),
            other => Err(format!("unknown analysis profile \"{other}\"")),
        }
    }
}

impl fmt::Display for AnalysisProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::Enhanced => f.write_str("enhanced"),
        }
    }
}

/// What moves an acquired image into analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// The user presses "Analyze Image".
    Manual,
    /// Analysis starts as soon as an image is acquired.
    Automatic,
}

impl FromStr for TriggerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "automatic" | "auto" => Ok(Self::Automatic),
            other => Err(format!("unknown trigger policy \"{other}\"")),
        }
    }
}

impl fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Automatic => f.write_str("automatic"),
        }
    }
}

/// A fixed instruction sent alongside the image.
///
/// Prompts are compiled in; `max_tokens` is forwarded to the provider as a
/// request parameter, the response is never truncated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub purpose: PromptPurpose,
    pub text: &'static str,
    pub max_tokens: u32,
}

/// Compressed image bytes in base64, plus the media type they were encoded as.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImagePayload {
    pub media_type: &'static str,
    pub data: String,
}

impl EncodedImagePayload {
    pub fn new(media_type: &'static str, data: String) -> Self {
        Self { media_type, data }
    }

    /// `data:<media_type>;base64,<data>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

impl fmt::Debug for EncodedImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImagePayload")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Result of one prompt: opaque text, or the failure for that call alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOutcome {
    pub purpose: PromptPurpose,
    pub result: Result<String, VisionError>,
}

impl PromptOutcome {
    pub fn text(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }
}

/// Text returned for one analysis cycle.
///
/// Each half carries its own result so a successful report survives a failed
/// summary and the other way around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub report: PromptOutcome,
    pub summary: Option<PromptOutcome>,
}

impl AnalysisResult {
    /// Pair up outcomes by purpose. The first non-summary outcome is the report.
    pub fn from_outcomes(outcomes: Vec<PromptOutcome>) -> Option<Self> {
        let mut report = None;
        let mut summary = None;
        for outcome in outcomes {
            match outcome.purpose {
                PromptPurpose::SpokenSummary if summary.is_none() => summary = Some(outcome),
                PromptPurpose::Report | PromptPurpose::QuickCheck if report.is_none() => {
                    report = Some(outcome)
                }
                _ => {}
            }
        }
        report.map(|report| Self { report, summary })
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_ref().and_then(PromptOutcome::text)
    }
}
