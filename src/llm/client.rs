//! OpenAI-compatible chat-completion client.

use crate::config::LlmConfig;
use crate::error::{classify_send_error, TutorError, TutorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A single system + user prompt sent to the model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that can answer a chat prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the request and return the assistant's text.
    async fn complete(&self, request: &ChatRequest) -> TutorResult<String>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Client for any `/chat/completions` endpoint (Groq, OpenAI, local servers).
pub struct OpenAiCompatibleClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_seconds: u64,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig, api_key: String) -> TutorResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    async fn complete(&self, request: &ChatRequest) -> TutorResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        debug!(
            "Sending chat request to {} (model {}, temperature {})",
            url, self.model, request.temperature
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(e, "Chat", &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Api {
                service: "Chat",
                status,
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(TutorError::EmptyResponse)?;

        debug!("Received {} characters from model", content.len());
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let body = ChatCompletionRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Hallo".to_string(),
            }],
            max_tokens: 1024,
            temperature: 0.5,
            stream: false,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"},"finish_reason":"stop"}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content, "{\"a\":1}");
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = LlmConfig {
            base_url: "https://api.groq.com/openai/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = OpenAiCompatibleClient::new(&config, "key".to_string()).unwrap();
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(client.model_name(), "llama-3.1-8b-instant");
    }

    fn client_for(server: &mockito::ServerGuard) -> OpenAiCompatibleClient {
        let config = LlmConfig {
            base_url: server.url(),
            ..LlmConfig::default()
        };
        OpenAiCompatibleClient::new(&config, "test-key".to_string()).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system: "Always respond with valid JSON.".to_string(),
            prompt: "Der Hund ist braun.".to_string(),
            temperature: 0.3,
            max_tokens: 512,
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama-3.1-8b-instant",
                "max_tokens": 512,
                "stream": false,
                "messages": [
                    {"role": "system", "content": "Always respond with valid JSON."},
                    {"role": "user", "content": "Der Hund ist braun."}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "chatcmpl-1",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "{\"nouns\": []}"},
                        "finish_reason": "stop"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let content = client_for(&server).complete(&request()).await.unwrap();

        assert_eq!(content, "{\"nouns\": []}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();

        match err {
            TutorError::Api {
                service,
                status,
                body,
            } => {
                assert_eq!(service, "Chat");
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "chatcmpl-2", "choices": []}"#)
            .create_async()
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();

        assert!(matches!(err, TutorError::EmptyResponse));
    }
}
