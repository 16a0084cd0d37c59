//! Data models for the tutor.
//!
//! This module contains the core data structures passed between the
//! analysis agents, the workflow and the renderers: CEFR levels, step
//! outcomes, per-agent analyses and the merged lesson.

use crate::error::TutorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// CEFR proficiency level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Breakthrough
    #[default]
    A1,
    /// Waystage
    A2,
    /// Threshold
    B1,
    /// Vantage
    B2,
    /// Effective operational proficiency
    C1,
    /// Mastery
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::A1,
        Level::A2,
        Level::B1,
        Level::B2,
        Level::C1,
        Level::C2,
    ];

    /// Position in the A1..C2 ladder (A1 = 0).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The level above this one, `None` at C2.
    pub fn next(&self) -> Option<Level> {
        Level::ALL.get(self.index() + 1).copied()
    }

    pub fn is_beginner(&self) -> bool {
        matches!(self, Level::A1 | Level::A2)
    }

    pub fn is_intermediate(&self) -> bool {
        matches!(self, Level::B1 | Level::B2)
    }

    /// Short human description of the level.
    pub fn label(&self) -> &'static str {
        match self {
            Level::A1 => "Beginner",
            Level::A2 => "Elementary",
            Level::B1 => "Intermediate",
            Level::B2 => "Upper intermediate",
            Level::C1 => "Advanced",
            Level::C2 => "Proficient",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Level {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            "C1" => Ok(Level::C1),
            "C2" => Ok(Level::C2),
            _ => Err(TutorError::InvalidLevel(s.to_string())),
        }
    }
}

/// Result of one external call, folded so the workflow never aborts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> StepOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(message.into()),
        }
    }

    /// The value when the step succeeded.
    pub fn value(&self) -> Option<&T> {
        if self.success {
            self.value.as_ref()
        } else {
            None
        }
    }
}

/// How hard a word is relative to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Unknown,
    Appropriate,
    Challenging,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Unknown => write!(f, "unknown"),
            Difficulty::Appropriate => write!(f, "appropriate"),
            Difficulty::Challenging => write!(f, "challenging"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl Difficulty {
    /// Returns an emoji representation of the difficulty.
    pub fn emoji(&self) -> &'static str {
        match self {
            Difficulty::Unknown => "⚪",
            Difficulty::Appropriate => "🟢",
            Difficulty::Challenging => "🟡",
            Difficulty::Advanced => "🔴",
        }
    }
}

/// Model replies send `null` for fields they have nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleNote {
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub case: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NounNote {
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub case: String,
    #[serde(deserialize_with = "null_as_default")]
    pub plural: String,
    #[serde(deserialize_with = "null_as_default")]
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbNote {
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(deserialize_with = "null_as_default")]
    pub infinitive: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tense: String,
    #[serde(deserialize_with = "null_as_default")]
    pub person: String,
    #[serde(deserialize_with = "null_as_default")]
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjectiveNote {
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(deserialize_with = "null_as_default")]
    pub declension: String,
    #[serde(deserialize_with = "null_as_default")]
    pub explanation: String,
}

/// Grammar breakdown of a German text.
///
/// Lists are empty and `raw_response` is set when the model reply could
/// not be read as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarAnalysis {
    #[serde(deserialize_with = "null_as_default")]
    pub articles: Vec<ArticleNote>,
    #[serde(deserialize_with = "null_as_default")]
    pub nouns: Vec<NounNote>,
    #[serde(deserialize_with = "null_as_default")]
    pub verbs: Vec<VerbNote>,
    #[serde(deserialize_with = "null_as_default")]
    pub adjectives: Vec<AdjectiveNote>,
    #[serde(deserialize_with = "null_as_default")]
    pub cases_explanation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level_appropriate_tip: String,
    #[serde(deserialize_with = "null_as_default")]
    pub common_mistakes: Vec<String>,
    #[serde(skip_deserializing)]
    pub source_text: String,
    #[serde(skip_deserializing)]
    pub analysis_level: Level,
    #[serde(skip_deserializing)]
    pub model_used: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl GrammarAnalysis {
    pub fn is_structured(&self) -> bool {
        self.raw_response.is_none()
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Prefix,
    Suffix,
    Root,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPart {
    pub part: String,
    #[serde(rename = "type")]
    pub kind: PartKind,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundAnalysis {
    pub original_word: String,
    pub is_compound: bool,
    pub components: Vec<String>,
    pub estimated_components: Vec<WordPart>,
    pub word_length: usize,
    pub complexity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub definition: String,
    pub part_of_speech: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyAnalysis {
    pub word: String,
    pub learner_level: Level,
    pub estimated_word_level: Level,
    pub compound_analysis: CompoundAnalysis,
    pub definitions: Vec<Definition>,
    pub learning_tips: Vec<String>,
    pub difficulty_assessment: Difficulty,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Correction {
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default")]
    pub correction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyHelp {
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(deserialize_with = "null_as_default")]
    pub meaning: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
}

/// Reply of the conversation partner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub german_response: String,
    #[serde(deserialize_with = "null_as_default")]
    pub english_translation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub corrections: Vec<Correction>,
    #[serde(deserialize_with = "null_as_default")]
    pub vocabulary_help: Vec<VocabularyHelp>,
    #[serde(deserialize_with = "null_as_default")]
    pub cultural_note: String,
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_tips: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub suggested_responses: Vec<String>,
    #[serde(skip_deserializing)]
    pub user_input: String,
    #[serde(skip_deserializing)]
    pub conversation_level: Level,
    #[serde(skip_deserializing)]
    pub model_used: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Situation the conversation partner plays, plus hints from earlier steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocabulary_focus: Vec<String>,
}

impl ConversationContext {
    pub fn new(topic: Option<String>, scenario: Option<String>) -> Self {
        Self {
            topic,
            scenario,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Lesson
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrammarInsights {
    pub main_structures: String,
    pub learning_tip: String,
    pub common_mistakes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyInsight {
    pub word: String,
    pub level: Level,
    pub is_compound: bool,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationPractice {
    pub suggested_response: String,
    pub translation: String,
    pub cultural_note: String,
    pub conversation_tips: Vec<String>,
}

/// The merged result of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub original_input: String,
    pub user_level: Level,
    pub learning_goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar_insights: Option<GrammarInsights>,
    #[serde(default)]
    pub vocabulary_insights: Vec<VocabularyInsight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_practice: Option<ConversationPractice>,
    #[serde(default)]
    pub learning_plan: Vec<String>,
    pub difficulty_assessment: Difficulty,
    pub estimated_study_time: String,
}

impl Lesson {
    /// Words from the lesson that decompose into parts.
    pub fn compound_words(&self) -> Vec<&str> {
        self.vocabulary_insights
            .iter()
            .filter(|v| v.is_compound)
            .map(|v| v.word.as_str())
            .collect()
    }
}
