//! Speech synthesis backends.

use crate::config::TtsConfig;
use crate::error::{classify_send_error, TutorError, TutorResult};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Turns text into encoded audio.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// MP3 bytes for `text` spoken by `voice`.
    async fn synthesize(&self, text: &str, voice: &str) -> TutorResult<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
    speed: f32,
}

/// Client for an OpenAI-compatible `/audio/speech` endpoint.
///
/// Edge voice names such as `de-DE-KatjaNeural` are passed through as-is,
/// so any proxy that maps them works.
pub struct HttpSpeechBackend {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    speed: f32,
    api_key: Option<String>,
    timeout_seconds: u64,
}

impl HttpSpeechBackend {
    pub fn new(config: &TtsConfig, api_key: Option<String>) -> TutorResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            speed: config.speed,
            api_key,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn request_body<'a>(&'a self, text: &'a str, voice: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: "mp3",
            speed: self.speed,
        }
    }
}

#[async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn synthesize(&self, text: &str, voice: &str) -> TutorResult<Vec<u8>> {
        let url = format!("{}/audio/speech", self.base_url);
        debug!("Requesting speech from {} with voice {}", url, voice);

        let mut request = self
            .http_client
            .post(&url)
            .json(&self.request_body(text, voice));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(e, "Speech", &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Api {
                service: "Speech",
                status,
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TutorError::EmptyResponse);
        }
        Ok(audio.to_vec())
    }
}
