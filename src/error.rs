//! Error types shared by the tutoring services.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Request timed out after {timeout}s")]
    Timeout { timeout: u64 },

    #[error("Cannot connect to {service} at {url}")]
    Connect { service: &'static str, url: String },

    #[error("{service} API error {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("API key missing: set the {var} environment variable")]
    MissingApiKey { var: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Invalid CEFR level: {0} (expected A1, A2, B1, B2, C1 or C2)")]
    InvalidLevel(String),

    #[error("Nothing to analyze: input text is empty")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TutorResult<T> = std::result::Result<T, TutorError>;

/// Map a reqwest send failure onto the error the user can act on.
pub fn classify_send_error(
    err: reqwest::Error,
    service: &'static str,
    url: &str,
    timeout: u64,
) -> TutorError {
    if err.is_timeout() {
        TutorError::Timeout { timeout }
    } else if err.is_connect() {
        TutorError::Connect {
            service,
            url: url.to_string(),
        }
    } else {
        TutorError::Network(err)
    }
}
