//! Chat-completion access for the tutoring agents.
//!
//! The agents talk to a [`ChatModel`]; the production implementation is an
//! OpenAI-compatible HTTP client (Groq by default).

pub mod client;
pub mod json;

pub use client::{ChatModel, ChatRequest, OpenAiCompatibleClient};
pub use json::extract_json;
