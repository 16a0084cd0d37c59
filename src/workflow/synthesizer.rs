//! Folding of step outcomes into a lesson.

use crate::models::{
    ConversationPractice, Difficulty, GrammarInsights, Lesson, VocabularyInsight,
};
use crate::workflow::orchestrator::LearningState;
use chrono::{DateTime, Utc};

pub const ESTIMATED_STUDY_TIME: &str = "10-15 minutes";

/// Build the lesson from every step that succeeded.
pub fn synthesize_lesson(state: &LearningState, now: DateTime<Utc>) -> Lesson {
    let grammar_insights = state.grammar_analysis().map(|g| GrammarInsights {
        main_structures: g.cases_explanation.clone(),
        learning_tip: g.level_appropriate_tip.clone(),
        common_mistakes: g.common_mistakes.clone(),
    });

    let vocabulary_insights: Vec<VocabularyInsight> = state
        .analyzed_words()
        .map(|v| VocabularyInsight {
            word: v.word.clone(),
            level: v.estimated_word_level,
            is_compound: v.compound_analysis.is_compound,
            difficulty: v.difficulty_assessment,
        })
        .collect();

    let conversation_practice = state.conversation_response().map(|c| ConversationPractice {
        suggested_response: c.german_response.clone(),
        translation: c.english_translation.clone(),
        cultural_note: c.cultural_note.clone(),
        conversation_tips: c.conversation_tips.clone(),
    });

    Lesson {
        original_input: state.request.text.clone(),
        user_level: state.request.level,
        learning_goal: state.request.goal.clone(),
        topic: state.request.context.topic.clone(),
        created_at: now,
        grammar_insights,
        difficulty_assessment: overall_difficulty(&vocabulary_insights),
        vocabulary_insights,
        conversation_practice,
        learning_plan: build_learning_plan(state),
        estimated_study_time: ESTIMATED_STUDY_TIME.to_string(),
    }
}

/// Personal study steps, in the order the agents ran.
pub fn build_learning_plan(state: &LearningState) -> Vec<String> {
    let mut plan = Vec::new();

    if let Some(grammar) = state.grammar_analysis() {
        plan.push("Review the grammatical structures identified in your text".to_string());
        if !grammar.common_mistakes.is_empty() {
            plan.push("Practice avoiding the common grammar mistakes highlighted".to_string());
        }
    }

    let compounds: Vec<&str> = state
        .analyzed_words()
        .filter(|v| v.compound_analysis.is_compound)
        .map(|v| v.word.as_str())
        .collect();
    if !compounds.is_empty() {
        plan.push(format!(
            "Practice breaking down compound words: {}",
            compounds.join(", ")
        ));
    }

    if let Some(conversation) = state.conversation_response() {
        plan.push("Practice the conversation scenario with the suggested responses".to_string());
        if !conversation.conversation_tips.is_empty() {
            plan.push("Apply the conversation tips in your next German conversation".to_string());
        }
    }

    plan
}

/// The hardest word decides; no words means unknown.
fn overall_difficulty(words: &[VocabularyInsight]) -> Difficulty {
    words
        .iter()
        .map(|w| w.difficulty)
        .max()
        .unwrap_or(Difficulty::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::vocabulary::{analyze_compound, assess_difficulty, estimate_level};
    use crate::models::{
        ConversationResponse, GrammarAnalysis, Level, StepOutcome, VocabularyAnalysis,
    };
    use crate::workflow::orchestrator::{LessonRequest, WordOutcome};

    fn word(word: &str, level: Level) -> WordOutcome {
        let estimated = estimate_level(word);
        WordOutcome {
            word: word.to_string(),
            outcome: StepOutcome::ok(VocabularyAnalysis {
                word: word.to_string(),
                learner_level: level,
                estimated_word_level: estimated,
                compound_analysis: analyze_compound(word),
                definitions: Vec::new(),
                learning_tips: Vec::new(),
                difficulty_assessment: assess_difficulty(estimated, level),
            }),
        }
    }

    #[test]
    fn test_hardest_word_sets_difficulty() {
        let mut state = LearningState::new(LessonRequest::new("text", Level::A2));
        state.vocabulary = vec![
            word("Haus", Level::A2),
            word("Fahrzeug", Level::A2),
            word("Mutter", Level::A2),
        ];

        let lesson = synthesize_lesson(&state, Utc::now());

        assert_eq!(lesson.vocabulary_insights.len(), 3);
        assert_eq!(lesson.vocabulary_insights[1].difficulty, Difficulty::Challenging);
        assert_eq!(lesson.difficulty_assessment, Difficulty::Challenging);
        assert_eq!(lesson.estimated_study_time, "10-15 minutes");
    }

    #[test]
    fn test_failed_steps_are_left_out() {
        let mut state = LearningState::new(LessonRequest::new("text", Level::A1));
        state.grammar = Some(StepOutcome::failed("Grammar analysis failed: timeout"));
        state.vocabulary = vec![
            WordOutcome {
                word: "Krankenhaus".to_string(),
                outcome: StepOutcome::failed("Vocabulary analysis failed: boom"),
            },
            word("Hausarbeit", Level::A1),
        ];
        state.conversation = Some(StepOutcome::failed("Conversation failed: timeout"));

        let lesson = synthesize_lesson(&state, Utc::now());

        assert!(lesson.grammar_insights.is_none());
        assert!(lesson.conversation_practice.is_none());
        assert_eq!(lesson.compound_words(), vec!["Hausarbeit"]);
        assert_eq!(
            lesson.learning_plan,
            vec!["Practice breaking down compound words: Hausarbeit"]
        );
    }

    #[test]
    fn test_plan_skips_optional_steps() {
        let mut state = LearningState::new(LessonRequest::new("text", Level::B1));
        state.grammar = Some(StepOutcome::ok(GrammarAnalysis::default()));
        state.conversation = Some(StepOutcome::ok(ConversationResponse {
            german_response: "Gern!".to_string(),
            ..Default::default()
        }));

        let plan = build_learning_plan(&state);

        assert_eq!(
            plan,
            vec![
                "Review the grammatical structures identified in your text",
                "Practice the conversation scenario with the suggested responses",
            ]
        );
    }
}
