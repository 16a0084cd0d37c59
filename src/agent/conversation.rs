//! Conversation partner: replies in German with corrections and cultural notes.

use crate::curriculum;
use crate::llm::{extract_json, ChatModel, ChatRequest};
use crate::models::{ConversationContext, ConversationResponse, Level, StepOutcome};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_GERMAN: &str = "Entschuldigung, können Sie das wiederholen?";
const FALLBACK_ENGLISH: &str = "Sorry, can you repeat that?";

/// Who said a line of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub message: String,
    pub level: Level,
}

/// Conversation practice agent. Remembers the turns it has seen.
pub struct ConversationPartner {
    model: Arc<dyn ChatModel>,
    temperature: f32,
    max_tokens: u32,
    history: Vec<Turn>,
}

impl ConversationPartner {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            temperature,
            max_tokens,
            history: Vec::new(),
        }
    }

    /// Answer the learner's message and point out mistakes.
    pub async fn practice(
        &mut self,
        message: &str,
        level: Level,
        context: &ConversationContext,
    ) -> StepOutcome<ConversationResponse> {
        info!("Running conversation practice at {}", level);

        self.history.push(Turn {
            speaker: Speaker::User,
            message: message.to_string(),
            level,
        });

        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(message, level, context),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let reply = match self.model.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Conversation failed: {}", e);
                return StepOutcome::failed(format!("Conversation failed: {}", e));
            }
        };

        let response = parse_reply(&reply, message, level, self.model.model_name());
        if response.raw_response.is_none() {
            self.history.push(Turn {
                speaker: Speaker::Assistant,
                message: response.german_response.clone(),
                level,
            });
        }

        StepOutcome::ok(response)
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Opening lines suited to `level`.
    pub fn starters(level: Level) -> &'static [&'static str] {
        curriculum::conversation_starters(level)
    }
}

/// Read the model reply; unreadable replies become a polite request to repeat.
pub fn parse_reply(reply: &str, message: &str, level: Level, model: &str) -> ConversationResponse {
    match serde_json::from_str::<ConversationResponse>(extract_json(reply)) {
        Ok(mut response) => {
            response.user_input = message.to_string();
            response.conversation_level = level;
            response.model_used = model.to_string();
            response
        }
        Err(e) => {
            debug!("Conversation reply is not structured JSON: {}", e);
            ConversationResponse {
                german_response: FALLBACK_GERMAN.to_string(),
                english_translation: FALLBACK_ENGLISH.to_string(),
                user_input: message.to_string(),
                conversation_level: level,
                raw_response: Some(reply.to_string()),
                note: Some("Response parsing failed, but conversation continues".to_string()),
                ..Default::default()
            }
        }
    }
}

fn build_prompt(message: &str, level: Level, context: &ConversationContext) -> String {
    let topic = context.topic.as_deref().unwrap_or("general conversation");
    let scenario = context.scenario.as_deref().unwrap_or("casual chat");

    let mut focus = String::new();
    if let Some(ref grammar) = context.grammar_focus {
        if !grammar.is_empty() {
            focus.push_str(&format!("- Grammar focus: {}\n", grammar));
        }
    }
    if !context.vocabulary_focus.is_empty() {
        focus.push_str(&format!(
            "- Vocabulary to reuse: {}\n",
            context.vocabulary_focus.join(", ")
        ));
    }

    format!(
        r#"You are a helpful German conversation partner. The user is learning German at {level} level.

Conversation Context:
- Topic: {topic}
- Scenario: {scenario}
- User's level: {level}
{focus}
User said: "{message}"

Please respond in this JSON format:
{{
    "german_response": "Your natural German response to continue the conversation",
    "english_translation": "English translation of your response",
    "corrections": [
        {{"error": "user's mistake", "correction": "corrected version", "explanation": "why this is better"}}
    ],
    "vocabulary_help": [
        {{"word": "difficult word from response", "meaning": "simple explanation", "level": "word difficulty"}}
    ],
    "cultural_note": "Optional cultural context about Germany/Austria/Switzerland",
    "conversation_tips": ["tip1", "tip2"],
    "suggested_responses": ["response option 1", "response option 2"]
}}

Guidelines:
- Respond naturally in German at {level} level
- Give gentle corrections without being overwhelming
- Include cultural context when relevant
- Keep the conversation flowing naturally
- Use appropriate formality level for the scenario"#
    )
}

const SYSTEM_PROMPT: &str =
    "You are a German conversation partner. Always respond with valid JSON.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedModel;
    use crate::error::TutorError;

    const REPLY: &str = r#"{
        "german_response": "Oh, das tut mir leid! Hast du schlecht geschlafen?",
        "english_translation": "Oh, I'm sorry! Did you sleep badly?",
        "corrections": [],
        "vocabulary_help": [{"word": "geschlafen", "meaning": "slept", "level": "A2"}],
        "cultural_note": "Germans often talk about sleep quality.",
        "conversation_tips": ["Use 'weil' to give reasons"],
        "suggested_responses": ["Ja, ich habe schlecht geschlafen."]
    }"#;

    #[tokio::test]
    async fn test_practice_records_history() {
        let model = Arc::new(ScriptedModel::replying(&[REPLY]));
        let mut partner = ConversationPartner::new(model.clone(), 0.7, 1024);
        let context = ConversationContext::new(Some("daily life".to_string()), None);

        let outcome = partner
            .practice("Hallo! Ich bin müde heute.", Level::A2, &context)
            .await;

        assert!(outcome.success);
        let response = outcome.value().unwrap();
        assert!(response.german_response.starts_with("Oh, das tut mir leid"));
        assert_eq!(response.vocabulary_help[0].word, "geschlafen");
        assert_eq!(response.user_input, "Hallo! Ich bin müde heute.");
        assert_eq!(response.conversation_level, Level::A2);

        assert_eq!(partner.history().len(), 2);
        assert_eq!(partner.history()[0].speaker, Speaker::User);
        assert_eq!(partner.history()[1].speaker, Speaker::Assistant);

        let prompt = model.prompt(0);
        assert!(prompt.contains("- Topic: daily life"));
        assert!(prompt.contains("- Scenario: casual chat"));
        assert_eq!(model.requests.lock().unwrap()[0].temperature, 0.7);

        partner.clear();
        assert!(partner.history().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_focus_from_earlier_steps() {
        let model = Arc::new(ScriptedModel::replying(&[REPLY]));
        let mut partner = ConversationPartner::new(model.clone(), 0.7, 1024);
        let context = ConversationContext {
            topic: Some("shopping".to_string()),
            scenario: Some("buying decisions".to_string()),
            grammar_focus: Some("Modal verbs send the infinitive to the end.".to_string()),
            vocabulary_focus: vec!["Fahrzeug".to_string(), "möchte".to_string()],
        };

        partner
            .practice("Ich möchte ein Fahrzeug kaufen.", Level::B1, &context)
            .await;

        let prompt = model.prompt(0);
        assert!(prompt.contains("- Grammar focus: Modal verbs send the infinitive to the end."));
        assert!(prompt.contains("- Vocabulary to reuse: Fahrzeug, möchte"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_canned_response() {
        let model = Arc::new(ScriptedModel::replying(&["Natürlich! Gern."]));
        let mut partner = ConversationPartner::new(model, 0.7, 1024);

        let outcome = partner
            .practice("Hallo", Level::A1, &ConversationContext::default())
            .await;

        assert!(outcome.success);
        let response = outcome.value().unwrap();
        assert_eq!(response.german_response, FALLBACK_GERMAN);
        assert_eq!(response.english_translation, FALLBACK_ENGLISH);
        assert_eq!(response.raw_response.as_deref(), Some("Natürlich! Gern."));
        assert_eq!(partner.history().len(), 1);
    }

    #[tokio::test]
    async fn test_null_fields_keep_reply_parsed() {
        let reply = r#"{
            "german_response": "Gute Besserung!",
            "english_translation": "Get well soon!",
            "corrections": null,
            "vocabulary_help": [{"word": "Besserung", "meaning": "recovery", "level": null}],
            "cultural_note": null,
            "conversation_tips": null,
            "conversation_level": "a1",
            "user_input": "echoed"
        }"#;
        let model = Arc::new(ScriptedModel::replying(&[reply]));
        let mut partner = ConversationPartner::new(model, 0.7, 1024);

        let outcome = partner
            .practice("Ich bin krank.", Level::B1, &ConversationContext::default())
            .await;

        let response = outcome.value().unwrap();
        assert!(response.raw_response.is_none());
        assert_eq!(response.german_response, "Gute Besserung!");
        assert_eq!(response.cultural_note, "");
        assert!(response.corrections.is_empty());
        assert_eq!(response.vocabulary_help[0].level, "");
        assert_eq!(response.conversation_level, Level::B1);
        assert_eq!(response.user_input, "Ich bin krank.");
        assert_eq!(partner.history().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_folded() {
        let model = Arc::new(ScriptedModel::new(vec![Err(TutorError::MissingApiKey {
            var: "GROQ_API_KEY".to_string(),
        })]));
        let mut partner = ConversationPartner::new(model, 0.7, 1024);

        let outcome = partner
            .practice("Hallo", Level::A1, &ConversationContext::default())
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("Conversation failed:"));
    }

    #[test]
    fn test_starters_follow_level() {
        assert_eq!(ConversationPartner::starters(Level::A1)[0], "Hallo! Wie heißen Sie?");
        assert_eq!(ConversationPartner::starters(Level::C2).len(), 4);
    }
}
