//! Dictionary lookups against the Wiktionary REST API.

use crate::config::DictionaryConfig;
use crate::error::{classify_send_error, TutorError, TutorResult};
use crate::models::Definition;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Definitions for one part of speech.
#[derive(Debug, Clone, Deserialize)]
pub struct DefinitionGroup {
    #[serde(rename = "partOfSpeech", default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub definitions: Vec<RawDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDefinition {
    #[serde(default)]
    pub definition: String,
}

impl DefinitionGroup {
    /// Flatten into plain-text definitions, dropping empty entries.
    pub fn to_definitions(&self) -> Vec<Definition> {
        self.definitions
            .iter()
            .map(|d| strip_html(&d.definition))
            .filter(|d| !d.is_empty())
            .map(|definition| Definition {
                definition,
                part_of_speech: self.part_of_speech.clone(),
            })
            .collect()
    }
}

/// Word lookup service.
#[async_trait]
pub trait Dictionary: Send + Sync {
    /// Definition groups for `word`, `None` when the dictionary has no entry.
    async fn definitions(&self, word: &str) -> TutorResult<Option<Vec<DefinitionGroup>>>;
}

/// Client for `GET {base}/page/definition/{word}`.
pub struct WiktionaryClient {
    http_client: reqwest::Client,
    base_url: String,
    language: String,
    timeout_seconds: u64,
}

impl WiktionaryClient {
    pub fn new(config: &DictionaryConfig) -> TutorResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn definition_url(&self, word: &str) -> TutorResult<Url> {
        let mut url = Url::parse(&format!("{}/page/definition", self.base_url))
            .map_err(|e| TutorError::Config(format!("invalid dictionary URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TutorError::Config("dictionary URL cannot be a base".to_string()))?
            .push(word);
        Ok(url)
    }
}

#[async_trait]
impl Dictionary for WiktionaryClient {
    async fn definitions(&self, word: &str) -> TutorResult<Option<Vec<DefinitionGroup>>> {
        let url = self.definition_url(word)?;
        debug!("Looking up {} at {}", word, url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                classify_send_error(e, "Dictionary", &self.base_url, self.timeout_seconds)
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No dictionary entry for {}", word);
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Api {
                service: "Dictionary",
                status,
                body,
            });
        }

        let mut by_language: HashMap<String, Vec<DefinitionGroup>> = response.json().await?;
        Ok(by_language.remove(&self.language))
    }
}

/// Remove markup tags and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the named entities Wiktionary emits plus numeric references.
/// Unknown entities are kept as written.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| entity_char(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let hex = code.strip_prefix('x').or_else(|| code.strip_prefix('X'));
            let value = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<span class=\"x\">A <a href=\"/wiki/car\">vehicle</a></span>"),
            "A vehicle"
        );
        assert_eq!(strip_html("  plain   text "), "plain text");
        assert_eq!(strip_html("<b></b>"), "");
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        assert_eq!(
            strip_html("<i>to say &quot;hello&quot;</i> &amp; wave"),
            "to say \"hello\" & wave"
        );
        assert_eq!(strip_html("the driver&#39;s seat"), "the driver's seat");
        assert_eq!(strip_html("&lt;colloquial&gt;&nbsp;car"), "<colloquial> car");
        assert_eq!(strip_html("&#x00FC;ber"), "über");
        assert_eq!(strip_html("&amp;lt; stays &bogus; AT&T"), "&lt; stays &bogus; AT&T");
    }

    #[test]
    fn test_parse_wiktionary_payload() {
        let raw = r#"{
            "de": [{
                "partOfSpeech": "Noun",
                "language": "German",
                "definitions": [
                    {"definition": "<a href=\"/wiki/vehicle\">vehicle</a>", "examples": []},
                    {"definition": ""}
                ]
            }],
            "en": []
        }"#;
        let mut parsed: HashMap<String, Vec<DefinitionGroup>> = serde_json::from_str(raw).unwrap();
        let groups = parsed.remove("de").unwrap();
        let defs = groups[0].to_definitions();

        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].definition, "vehicle");
        assert_eq!(defs[0].part_of_speech, "Noun");
    }

    #[test]
    fn test_definition_url_encodes_word() {
        let client = WiktionaryClient::new(&DictionaryConfig::default()).unwrap();
        let url = client.definition_url("Straße").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wiktionary.org/api/rest_v1/page/definition/Stra%C3%9Fe"
        );
    }

    fn client_for(server: &mockito::ServerGuard, language: &str) -> WiktionaryClient {
        let config = DictionaryConfig {
            base_url: server.url(),
            language: language.to_string(),
            user_agent: "lehrer-test".to_string(),
            ..DictionaryConfig::default()
        };
        WiktionaryClient::new(&config).unwrap()
    }

    const KRANKENHAUS: &str = r#"{
        "en": [{"partOfSpeech": "Noun", "language": "English", "definitions": [{"definition": "not this one"}]}],
        "de": [{"partOfSpeech": "Noun", "language": "German", "definitions": [{"definition": "<b>hospital</b>"}]}]
    }"#;

    #[tokio::test]
    async fn test_definitions_pick_configured_language() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page/definition/Krankenhaus")
            .match_header("user-agent", "lehrer-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(KRANKENHAUS)
            .expect(2)
            .create_async()
            .await;

        let groups = client_for(&server, "de")
            .definitions("Krankenhaus")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(groups[0].language, "German");
        assert_eq!(groups[0].to_definitions()[0].definition, "hospital");

        let english = client_for(&server, "en")
            .definitions("Krankenhaus")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(english[0].language, "English");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_language_section_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/page/definition/Krankenhaus")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(KRANKENHAUS)
            .create_async()
            .await;

        let groups = client_for(&server, "fr").definitions("Krankenhaus").await.unwrap();

        assert!(groups.is_none());
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/page/definition/Quatschwort")
            .with_status(404)
            .with_body(r#"{"title": "Not found."}"#)
            .create_async()
            .await;

        let groups = client_for(&server, "de").definitions("Quatschwort").await.unwrap();

        assert!(groups.is_none());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/page/definition/Haus")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = client_for(&server, "de").definitions("Haus").await.unwrap_err();

        assert!(matches!(
            err,
            TutorError::Api {
                service: "Dictionary",
                status: 503,
                ..
            }
        ));
    }
}
