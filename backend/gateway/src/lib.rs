//! finsight gateway HTTP server.
//!
//! Serves the identifier page, accepts captures and uploads, and drives each
//! session's analysis cycle.

pub mod attachments;
pub mod control_ui;
pub mod controller;
pub mod pipeline;
pub mod server;
pub mod session_registry;

pub use controller::{Effect, SessionController, SessionEvent, SessionState};
pub use pipeline::{AnalysisPipeline, CycleError, CycleReport, SpeechOutcome};
pub use server::{build_router, start_server, GatewayState};
pub use session_registry::SessionRegistry;
