//! Analysis Cycle Event Logger
//!
//! Structured events for each analysis cycle, written through `tracing` so they
//! land in the rolling NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

/// `tracing` target of every cycle event.
pub const CYCLE_EVENT_TARGET: &str = "cycle_events";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleEvent {
    ImageAcquired {
        origin: String,
        width: u32,
        height: u32,
    },
    AnalysisStarted {
        cycle: u64,
        profile: String,
    },
    PromptCompleted {
        purpose: String,
        chars: usize,
    },
    PromptFailed {
        purpose: String,
        error: String,
    },
    SpeechRendered {
        bytes: usize,
    },
    SpeechFailed {
        error: String,
    },
    CycleFailed {
        error: String,
    },
    CycleSuperseded {
        cycle: u64,
    },
}

impl CycleEvent {
    fn redacted(mut self) -> Self {
        match &mut self {
            Self::PromptFailed { error, .. }
            | Self::SpeechFailed { error }
            | Self::CycleFailed { error } => {
                *error = redact_sensitive_data(error);
            }
            _ => {}
        }
        self
    }
}

#[derive(Debug, Serialize)]
pub struct CycleLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: CycleEvent,
}

pub struct CycleLogger;

impl CycleLogger {
    /// Build the entry that `log_event` emits.
    pub fn entry(session_id: &str, event: CycleEvent) -> CycleLogEntry {
        CycleLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event: event.redacted(),
        }
    }

    /// Logs a cycle event, redacting any error text first.
    pub fn log_event(session_id: &str, event: CycleEvent) {
        let entry = Self::entry(session_id, event);
        info!(target: CYCLE_EVENT_TARGET, event = ?entry, "Analysis cycle event");
    }
}
