//! Grammar master: articles, cases and verb forms explained by the LLM.

use crate::llm::{extract_json, ChatModel, ChatRequest};
use crate::models::{GrammarAnalysis, Level, StepOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Grammar analysis agent.
pub struct GrammarMaster {
    model: Arc<dyn ChatModel>,
    temperature: f32,
    max_tokens: u32,
}

impl GrammarMaster {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            temperature,
            max_tokens,
        }
    }

    /// Analyze the grammar of `text` for a learner at `level`.
    pub async fn analyze(&self, text: &str, level: Level) -> StepOutcome<GrammarAnalysis> {
        info!("Running grammar analysis ({} characters, {})", text.len(), level);

        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(text, level),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.model.complete(&request).await {
            Ok(reply) => StepOutcome::ok(parse_reply(&reply, text, level, self.model.model_name())),
            Err(e) => {
                warn!("Grammar analysis failed: {}", e);
                StepOutcome::failed(format!("Grammar analysis failed: {}", e))
            }
        }
    }
}

/// Read the model reply, keeping it raw when it is not the expected JSON.
pub fn parse_reply(reply: &str, text: &str, level: Level, model: &str) -> GrammarAnalysis {
    let mut analysis = match serde_json::from_str::<GrammarAnalysis>(extract_json(reply)) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Grammar reply is not structured JSON: {}", e);
            GrammarAnalysis {
                raw_response: Some(reply.to_string()),
                note: Some("Grammar analysis provided but not in structured format".to_string()),
                ..Default::default()
            }
        }
    };

    analysis.source_text = text.to_string();
    analysis.analysis_level = level;
    if analysis.is_structured() {
        analysis.model_used = model.to_string();
    }
    analysis
}

fn build_prompt(text: &str, level: Level) -> String {
    format!(
        r#"You are a German grammar expert. Analyze this German text and provide educational explanations suitable for {level} level learners.

Text to analyze: "{text}"

Please provide analysis in this JSON format:
{{
    "articles": [
        {{"word": "der", "type": "definite", "case": "nominativ", "gender": "masculine", "explanation": "..."}}
    ],
    "nouns": [
        {{"word": "Hund", "gender": "masculine", "case": "nominativ", "plural": "Hunde", "explanation": "..."}}
    ],
    "verbs": [
        {{"word": "ist", "infinitive": "sein", "tense": "präsens", "person": "3rd singular", "explanation": "..."}}
    ],
    "adjectives": [
        {{"word": "groß", "declension": "predicative", "explanation": "..."}}
    ],
    "cases_explanation": "Brief explanation of the cases used in this sentence",
    "level_appropriate_tip": "One helpful tip for {level} learners",
    "common_mistakes": ["Mistake 1", "Mistake 2"]
}}

Focus on practical learning points. Explain WHY the grammar works this way, not just WHAT it is."#
    )
}

const SYSTEM_PROMPT: &str =
    "You are a helpful German grammar teacher. Always respond with valid JSON.";

/// One-line explanation of a German case.
pub fn case_explanation(case: &str) -> &'static str {
    match case.to_lowercase().as_str() {
        "nominativ" | "nominative" => {
            "The subject of the sentence - who or what is doing the action"
        }
        "akkusativ" | "accusative" => "The direct object - who or what receives the action",
        "dativ" | "dative" => "The indirect object - to whom or for whom something is done",
        "genitiv" | "genitive" => "Shows possession or relationship - whose or of what",
        _ => "Unknown case",
    }
}

/// Definite article forms for one gender across the four cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleTable {
    pub nominativ: &'static str,
    pub akkusativ: &'static str,
    pub dativ: &'static str,
    pub genitiv: &'static str,
}

impl ArticleTable {
    /// `(case, article)` pairs in textbook order.
    pub fn rows(&self) -> [(&'static str, &'static str); 4] {
        [
            ("nominativ", self.nominativ),
            ("akkusativ", self.akkusativ),
            ("dativ", self.dativ),
            ("genitiv", self.genitiv),
        ]
    }
}

pub const GENDERS: [&str; 4] = ["masculine", "feminine", "neuter", "plural"];

pub fn article_table(gender: &str) -> Option<ArticleTable> {
    match gender.to_lowercase().as_str() {
        "masculine" | "maskulin" => Some(ArticleTable {
            nominativ: "der",
            akkusativ: "den",
            dativ: "dem",
            genitiv: "des",
        }),
        "feminine" | "feminin" => Some(ArticleTable {
            nominativ: "die",
            akkusativ: "die",
            dativ: "der",
            genitiv: "der",
        }),
        "neuter" | "neutrum" => Some(ArticleTable {
            nominativ: "das",
            akkusativ: "das",
            dativ: "dem",
            genitiv: "des",
        }),
        "plural" => Some(ArticleTable {
            nominativ: "die",
            akkusativ: "die",
            dativ: "den",
            genitiv: "der",
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedModel;
    use crate::error::TutorError;

    const STRUCTURED_REPLY: &str = r#"```json
{
    "articles": [{"word": "Der", "type": "definite", "case": "nominativ", "gender": "masculine", "explanation": "Subject"}],
    "nouns": [{"word": "Hund", "gender": "masculine", "case": "nominativ", "plural": "Hunde", "explanation": "Subject"}],
    "verbs": [{"word": "ist", "infinitive": "sein", "tense": "präsens", "person": "3rd singular", "explanation": "Copula"}],
    "adjectives": [{"word": "braun", "declension": "predicative", "explanation": "No ending"}],
    "cases_explanation": "Only the nominative is used.",
    "level_appropriate_tip": "Learn nouns with their article.",
    "common_mistakes": ["Using 'die Hund'"]
}
```"#;

    #[tokio::test]
    async fn test_structured_analysis() {
        let model = Arc::new(ScriptedModel::replying(&[STRUCTURED_REPLY]));
        let agent = GrammarMaster::new(model.clone(), 0.3, 1024);

        let outcome = agent.analyze("Der große Hund ist braun.", Level::A1).await;

        assert!(outcome.success);
        let analysis = outcome.value().unwrap();
        assert!(analysis.is_structured());
        assert_eq!(analysis.nouns[0].word, "Hund");
        assert_eq!(analysis.verbs[0].infinitive, "sein");
        assert_eq!(analysis.level_appropriate_tip, "Learn nouns with their article.");
        assert_eq!(analysis.source_text, "Der große Hund ist braun.");
        assert_eq!(analysis.analysis_level, Level::A1);
        assert_eq!(analysis.model_used, "scripted-model");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, 0.3);
        assert!(requests[0].prompt.contains("A1 level learners"));
        assert!(requests[0].system.contains("valid JSON"));
    }

    #[tokio::test]
    async fn test_unstructured_reply_falls_back_to_raw() {
        let model = Arc::new(ScriptedModel::replying(&["Der Satz steht im Nominativ."]));
        let agent = GrammarMaster::new(model, 0.3, 1024);

        let outcome = agent.analyze("Der Hund.", Level::A2).await;

        assert!(outcome.success);
        let analysis = outcome.value().unwrap();
        assert!(!analysis.is_structured());
        assert_eq!(
            analysis.raw_response.as_deref(),
            Some("Der Satz steht im Nominativ.")
        );
        assert!(analysis.nouns.is_empty());
        assert_eq!(analysis.source_text, "Der Hund.");
    }

    #[tokio::test]
    async fn test_null_fields_keep_reply_structured() {
        let reply = r#"{
            "nouns": [{"word": "Krankenhaus", "gender": "neuter", "case": "akkusativ", "plural": null, "explanation": null}],
            "verbs": null,
            "cases_explanation": "Accusative after 'ins'.",
            "level_appropriate_tip": null,
            "analysis_level": "b1",
            "model_used": "someone-else",
            "source_text": "echoed"
        }"#;
        let model = Arc::new(ScriptedModel::replying(&[reply]));
        let agent = GrammarMaster::new(model, 0.3, 1024);

        let outcome = agent.analyze("Ich gehe ins Krankenhaus.", Level::A2).await;

        let analysis = outcome.value().unwrap();
        assert!(analysis.is_structured());
        assert_eq!(analysis.nouns.len(), 1);
        assert_eq!(analysis.nouns[0].word, "Krankenhaus");
        assert_eq!(analysis.nouns[0].plural, "");
        assert!(analysis.verbs.is_empty());
        assert_eq!(analysis.level_appropriate_tip, "");
        assert_eq!(analysis.analysis_level, Level::A2);
        assert_eq!(analysis.model_used, "scripted-model");
        assert_eq!(analysis.source_text, "Ich gehe ins Krankenhaus.");
    }

    #[tokio::test]
    async fn test_transport_failure_is_folded() {
        let model = Arc::new(ScriptedModel::new(vec![Err(TutorError::Timeout {
            timeout: 60,
        })]));
        let agent = GrammarMaster::new(model, 0.3, 1024);

        let outcome = agent.analyze("Der Hund.", Level::A1).await;

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .starts_with("Grammar analysis failed: Request timed out"));
    }

    #[test]
    fn test_case_explanation() {
        assert!(case_explanation("Dativ").contains("indirect object"));
        assert!(case_explanation("akkusativ").contains("direct object"));
        assert_eq!(case_explanation("vokativ"), "Unknown case");
    }

    #[test]
    fn test_article_table() {
        let masc = article_table("masculine").unwrap();
        assert_eq!(masc.akkusativ, "den");
        assert_eq!(masc.genitiv, "des");

        let fem = article_table("Feminine").unwrap();
        assert_eq!(fem.dativ, "der");

        let plural = article_table("plural").unwrap();
        assert_eq!(plural.rows()[2], ("dativ", "den"));

        assert!(article_table("unknown").is_none());
    }
}
