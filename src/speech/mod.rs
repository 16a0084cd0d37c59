//! Text-to-speech for German practice sentences.

pub mod backend;
pub mod helper;

pub use backend::{HttpSpeechBackend, SpeechBackend};
pub use helper::{available_voices, AudioStats, SpeechHelper, Voice};
