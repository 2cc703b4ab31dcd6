//! Telemetry and structured logging components for finsight.
//!
//! Handles log redaction, console plus rolling NDJSON output, and
//! per-analysis-cycle event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CycleEvent, CycleLogEntry, CycleLogger, CYCLE_EVENT_TARGET};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
