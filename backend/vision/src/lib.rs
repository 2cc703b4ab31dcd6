pub mod client;
pub mod prompts;
pub mod providers;

pub use client::InferenceClient;
pub use prompts::{prompts_for, QUICK_CHECK_PROMPT, REPORT_PROMPT, SPOKEN_SUMMARY_PROMPT};
pub use providers::{MockVisionProvider, OpenAiVisionProvider};
