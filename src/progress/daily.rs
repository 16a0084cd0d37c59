//! Daily lesson plan built from the learner's record.

use crate::curriculum::{practice_material, PracticeMaterial};
use crate::models::Level;
use crate::progress::record::{DailyGoals, UserProgress};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const WARM_UP_WORDS: usize = 5;

const REFLECTION_QUESTIONS: [&str; 3] = [
    "What was the most challenging part of today's lesson?",
    "Which new word or grammar point will you use this week?",
    "How confident do you feel about today's topics (1-10)?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    Grammar,
    Vocabulary,
    Conversation,
    Comprehensive,
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusArea::Grammar => write!(f, "grammar"),
            FocusArea::Vocabulary => write!(f, "vocabulary"),
            FocusArea::Conversation => write!(f, "conversation"),
            FocusArea::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    GrammarAnalysis,
    VocabularyBuilding,
    ConversationPractice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    /// Sentence, word or opening line to work on.
    pub material: String,
    pub focus: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarmUp {
    pub words: Vec<String>,
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonContent {
    pub warm_up: WarmUp,
    pub main_exercises: Vec<Exercise>,
    pub practice_conversations: Vec<Exercise>,
    pub reflection_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStats {
    pub current_streak: u32,
    pub words_learned: usize,
    pub grammar_patterns: usize,
    pub completion_rate: f64,
}

/// Today's personalised lesson.
#[derive(Debug, Clone, Serialize)]
pub struct DailyLesson {
    pub date: DateTime<Utc>,
    pub user_level: Level,
    pub target_level: Level,
    pub lesson_number: u32,
    pub estimated_duration: String,
    pub focus_areas: Vec<FocusArea>,
    pub content: LessonContent,
    pub daily_goals: DailyGoals,
    pub stats: ProgressStats,
    pub motivation_message: String,
}

pub fn daily_lesson(progress: &UserProgress, now: DateTime<Utc>) -> DailyLesson {
    let focus_areas = lesson_focus(progress);
    let content = lesson_content(progress, &focus_areas);

    DailyLesson {
        date: now,
        user_level: progress.current_level,
        target_level: progress.target_level,
        lesson_number: progress.total_sessions + 1,
        estimated_duration: format!("{} minutes", progress.daily_goals.target_minutes),
        focus_areas,
        content,
        daily_goals: progress.daily_goals.clone(),
        stats: ProgressStats {
            current_streak: progress.learning_streak,
            words_learned: progress.vocabulary_learned.len(),
            grammar_patterns: progress.grammar_patterns_mastered.len(),
            completion_rate: completion_rate(progress),
        },
        motivation_message: motivation_message(progress),
    }
}

/// Weak skills first; conversation also comes up every third session.
pub fn lesson_focus(progress: &UserProgress) -> Vec<FocusArea> {
    let weak = &progress.weak_areas;
    let mut focus = Vec::new();

    if !weak.grammar.is_empty() {
        focus.push(FocusArea::Grammar);
    }
    if !weak.vocabulary.is_empty() {
        focus.push(FocusArea::Vocabulary);
    }
    if !weak.conversation.is_empty() || progress.total_sessions % 3 == 0 {
        focus.push(FocusArea::Conversation);
    }

    if focus.is_empty() {
        focus.push(FocusArea::Comprehensive);
    }
    focus
}

fn lesson_content(progress: &UserProgress, focus: &[FocusArea]) -> LessonContent {
    let material = practice_material(progress.current_level);
    let mut content = LessonContent {
        warm_up: WarmUp {
            words: progress
                .recent_words(WARM_UP_WORDS)
                .into_iter()
                .map(String::from)
                .collect(),
            instruction: "Review these words you've learned recently".to_string(),
        },
        main_exercises: Vec::new(),
        practice_conversations: Vec::new(),
        reflection_questions: REFLECTION_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    };

    for area in focus {
        match area {
            FocusArea::Grammar => content.main_exercises.push(grammar_exercise(&material)),
            FocusArea::Vocabulary => content.main_exercises.push(vocabulary_exercise(&material)),
            FocusArea::Conversation => content
                .practice_conversations
                .push(conversation_exercise(&material)),
            FocusArea::Comprehensive => {
                content.main_exercises.push(grammar_exercise(&material));
                content.main_exercises.push(vocabulary_exercise(&material));
                content
                    .practice_conversations
                    .push(conversation_exercise(&material));
            }
        }
    }

    content
}

fn grammar_exercise(material: &PracticeMaterial) -> Exercise {
    Exercise {
        kind: ExerciseKind::GrammarAnalysis,
        material: material.grammar_sentence.to_string(),
        focus: "Analyze the grammar structure of this sentence".to_string(),
    }
}

fn vocabulary_exercise(material: &PracticeMaterial) -> Exercise {
    Exercise {
        kind: ExerciseKind::VocabularyBuilding,
        material: material.vocabulary_word.to_string(),
        focus: "Break down this compound word and find related words".to_string(),
    }
}

fn conversation_exercise(material: &PracticeMaterial) -> Exercise {
    Exercise {
        kind: ExerciseKind::ConversationPractice,
        material: material.conversation_scenario.to_string(),
        focus: "Practice this conversation scenario".to_string(),
    }
}

/// 20% for showing up plus up to 80% for a week-long streak.
pub fn completion_rate(progress: &UserProgress) -> f64 {
    if progress.total_sessions == 0 {
        return 0.0;
    }
    (progress.learning_streak as f64 / 7.0 * 0.8 + 0.2).min(1.0)
}

pub fn motivation_message(progress: &UserProgress) -> String {
    let streak = progress.learning_streak;
    let level = progress.current_level;
    let words = progress.vocabulary_learned.len();

    if streak >= 7 {
        format!(
            "🔥 Amazing! {} day streak! You're mastering {} level German!",
            streak, level
        )
    } else if streak >= 3 {
        format!(
            "👏 Great consistency! {} days in a row. Keep it up!",
            streak
        )
    } else if words >= 50 {
        format!(
            "📚 Impressive vocabulary! You've learned {} German words!",
            words
        )
    } else {
        format!(
            "🌟 Every step counts! You're building your German skills at {} level.",
            level
        )
    }
}
