//! Markdown rendering for model output.
//!
//! Responses are rendered verbatim as markdown. Raw HTML inside a response is
//! shown as text, never injected into the page.

pub mod renderer;

pub use renderer::Renderer;
