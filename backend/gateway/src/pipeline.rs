//! One analysis cycle: encode, infer, then speak the summary.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use finsight_core::{AnalysisProfile, AnalysisResult, PromptOutcome};
use finsight_logging::{redact_sensitive_data, CycleEvent, CycleLogger};
use finsight_media::{encode_for_transport, CapturedImage, MediaError, DEFAULT_JPEG_QUALITY};
use finsight_tts::{PlaybackClip, SpeechRenderer};
use finsight_vision::{prompts_for, InferenceClient};

/// Failure that ends a cycle before any text is available.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Encode(#[from] MediaError),

    #[error("no report prompt configured for this profile")]
    MissingReport,
}

/// What happened to the spoken summary.
#[derive(Debug, Clone)]
pub enum SpeechOutcome {
    /// The profile does not speak, or no renderer is configured.
    NotRequested,
    /// There was no summary text to speak.
    Skipped,
    Ready(PlaybackClip),
    Failed(String),
}

/// Everything a finished cycle shows the user.
#[derive(Debug)]
pub struct CycleReport {
    pub analysis: Result<AnalysisResult, CycleError>,
    pub speech: SpeechOutcome,
}

pub struct AnalysisPipeline {
    inference: InferenceClient,
    speech: Option<Arc<SpeechRenderer>>,
    profile: AnalysisProfile,
    jpeg_quality: u8,
}

impl AnalysisPipeline {
    pub fn new(inference: InferenceClient, profile: AnalysisProfile) -> Self {
        Self {
            inference,
            speech: None,
            profile,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_speech(mut self, renderer: Arc<SpeechRenderer>) -> Self {
        self.speech = Some(renderer);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn profile(&self) -> AnalysisProfile {
        self.profile
    }

    /// Run a full cycle. Never fails: every error ends up in the report.
    pub async fn run(&self, session_id: &str, cycle: u64, image: &CapturedImage) -> CycleReport {
        CycleLogger::log_event(
            session_id,
            CycleEvent::AnalysisStarted {
                cycle,
                profile: self.profile.to_string(),
            },
        );

        let payload = match encode_for_transport(image, self.jpeg_quality) {
            Ok(payload) => payload,
            Err(e) => {
                CycleLogger::log_event(session_id, CycleEvent::CycleFailed { error: e.to_string() });
                return CycleReport {
                    analysis: Err(e.into()),
                    speech: SpeechOutcome::NotRequested,
                };
            }
        };

        let outcomes = self.inference.analyze(&payload, prompts_for(self.profile)).await;
        for outcome in &outcomes {
            log_outcome(session_id, outcome);
        }

        let Some(result) = AnalysisResult::from_outcomes(outcomes) else {
            CycleLogger::log_event(
                session_id,
                CycleEvent::CycleFailed {
                    error: CycleError::MissingReport.to_string(),
                },
            );
            return CycleReport {
                analysis: Err(CycleError::MissingReport),
                speech: SpeechOutcome::NotRequested,
            };
        };

        let speech = self.speak(session_id, &result).await;
        info!(session = %session_id, cycle, model = %self.inference.model(), "Analysis cycle finished");

        CycleReport {
            analysis: Ok(result),
            speech,
        }
    }

    async fn speak(&self, session_id: &str, result: &AnalysisResult) -> SpeechOutcome {
        let renderer = match &self.speech {
            Some(renderer) if self.profile.speaks() => renderer,
            _ => return SpeechOutcome::NotRequested,
        };
        let Some(summary) = result.summary_text() else {
            return SpeechOutcome::Skipped;
        };

        match renderer.render(summary).await {
            Ok(clip) => {
                CycleLogger::log_event(
                    session_id,
                    CycleEvent::SpeechRendered {
                        bytes: clip.audio.len(),
                    },
                );
                SpeechOutcome::Ready(clip)
            }
            Err(e) => {
                let detail = redact_sensitive_data(&e.to_string());
                warn!(session = %session_id, error = %detail, "Speech rendering failed");
                CycleLogger::log_event(session_id, CycleEvent::SpeechFailed { error: detail.clone() });
                SpeechOutcome::Failed(detail)
            }
        }
    }
}

fn log_outcome(session_id: &str, outcome: &PromptOutcome) {
    let event = match &outcome.result {
        Ok(text) => CycleEvent::PromptCompleted {
            purpose: outcome.purpose.to_string(),
            chars: text.chars().count(),
        },
        Err(e) => CycleEvent::PromptFailed {
            purpose: outcome.purpose.to_string(),
            error: e.to_string(),
        },
    };
    CycleLogger::log_event(session_id, event);
}
