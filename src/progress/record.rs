//! The persisted learner record and the rules that update it.

use crate::models::{Lesson, Level};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Score stored with every lesson until learner interaction is measured.
const DEFAULT_PERFORMANCE_SCORE: f64 = 0.8;

/// What kind of session produced a lesson record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    #[default]
    Comprehensive,
    Conversation,
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonKind::Comprehensive => write!(f, "comprehensive"),
            LessonKind::Conversation => write!(f, "conversation"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    pub date: DateTime<Utc>,
    pub lesson_type: LessonKind,
    pub level: Level,
    #[serde(default)]
    pub topics_covered: Vec<String>,
    #[serde(default)]
    pub words_learned: Vec<String>,
    #[serde(default)]
    pub grammar_points: Vec<String>,
    pub performance_score: f64,
}

/// Notes grouped by skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillAreas {
    pub grammar: Vec<String>,
    pub vocabulary: Vec<String>,
    pub conversation: Vec<String>,
}

impl SkillAreas {
    pub fn is_empty(&self) -> bool {
        self.grammar.is_empty() && self.vocabulary.is_empty() && self.conversation.is_empty()
    }

    /// File a learning-plan step under the skill it mentions.
    fn classify(&mut self, step: &str) {
        let lower = step.to_lowercase();
        let bucket = if lower.contains("grammar") {
            &mut self.grammar
        } else if lower.contains("vocabulary") || lower.contains("word") {
            &mut self.vocabulary
        } else if lower.contains("conversation") {
            &mut self.conversation
        } else {
            return;
        };
        push_unique(bucket, step);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedWord {
    pub learned_date: DateTime<Utc>,
    pub level: Level,
    pub is_compound: bool,
    pub mastery_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGoals {
    pub target_minutes: u32,
    pub target_exercises: u32,
    pub target_new_words: u32,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            target_minutes: 15,
            target_exercises: 3,
            target_new_words: 5,
        }
    }
}

/// Snapshot appended after every lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub level: Level,
    pub streak: u32,
    pub total_words: usize,
    pub total_grammar: usize,
}

/// Everything known about one learner, stored as pretty-printed JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub current_level: Level,
    pub target_level: Level,
    pub learning_streak: u32,
    pub total_sessions: u32,
    #[serde(default)]
    pub lessons_completed: Vec<LessonRecord>,
    #[serde(default)]
    pub weak_areas: SkillAreas,
    #[serde(default)]
    pub strong_areas: SkillAreas,
    #[serde(default)]
    pub vocabulary_learned: BTreeMap<String, LearnedWord>,
    #[serde(default)]
    pub grammar_patterns_mastered: Vec<String>,
    #[serde(default)]
    pub conversation_topics_practiced: Vec<String>,
    #[serde(default)]
    pub daily_goals: DailyGoals,
    #[serde(default)]
    pub last_lesson_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress_history: Vec<HistoryEntry>,
}

/// Counts a learner needs before moving past a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionThreshold {
    pub vocabulary: usize,
    pub grammar: usize,
    pub sessions: u32,
}

/// `None` for C2, which has nothing above it.
pub fn promotion_threshold(level: Level) -> Option<PromotionThreshold> {
    let (vocabulary, grammar, sessions) = match level {
        Level::A1 => (50, 10, 20),
        Level::A2 => (100, 20, 40),
        Level::B1 => (200, 30, 60),
        Level::B2 => (400, 40, 80),
        Level::C1 => (600, 50, 100),
        Level::C2 => return None,
    };
    Some(PromotionThreshold {
        vocabulary,
        grammar,
        sessions,
    })
}

/// Streak after a lesson at `now`: consecutive days grow it, a second
/// lesson the same day keeps it, any gap restarts it.
pub fn next_streak(current: u32, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(last) = last else {
        return 1;
    };

    let last_day = last.with_timezone(&Local).date_naive();
    let today = now.with_timezone(&Local).date_naive();

    match (today - last_day).num_days() {
        0 => current.max(1),
        1 => current + 1,
        _ => 1,
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>, target_level: Level, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            created_at: now,
            current_level: Level::A1,
            target_level,
            learning_streak: 0,
            total_sessions: 0,
            lessons_completed: Vec::new(),
            weak_areas: SkillAreas::default(),
            strong_areas: SkillAreas::default(),
            vocabulary_learned: BTreeMap::new(),
            grammar_patterns_mastered: Vec::new(),
            conversation_topics_practiced: Vec::new(),
            daily_goals: DailyGoals::default(),
            last_lesson_date: None,
            progress_history: Vec::new(),
        }
    }

    /// Fold a finished lesson into the record.
    ///
    /// Returns the new level when the learner was promoted.
    pub fn apply_lesson(
        &mut self,
        lesson: &Lesson,
        kind: LessonKind,
        now: DateTime<Utc>,
    ) -> Option<Level> {
        self.total_sessions += 1;
        self.learning_streak = next_streak(self.learning_streak, self.last_lesson_date, now);
        self.last_lesson_date = Some(now);

        let mut record = LessonRecord {
            date: now,
            lesson_type: kind,
            level: lesson.user_level,
            topics_covered: Vec::new(),
            words_learned: Vec::new(),
            grammar_points: Vec::new(),
            performance_score: DEFAULT_PERFORMANCE_SCORE,
        };

        for insight in &lesson.vocabulary_insights {
            self.vocabulary_learned.insert(
                insight.word.clone(),
                LearnedWord {
                    learned_date: now,
                    level: insight.level,
                    is_compound: insight.is_compound,
                    mastery_level: "introduced".to_string(),
                },
            );
            record.words_learned.push(insight.word.clone());
        }

        if let Some(ref grammar) = lesson.grammar_insights {
            let structures = grammar.main_structures.trim();
            if !structures.is_empty() {
                push_unique(&mut self.grammar_patterns_mastered, structures);
                record.grammar_points.push(structures.to_string());
            }
        }

        for step in &lesson.learning_plan {
            self.weak_areas.classify(step);
        }

        if lesson.conversation_practice.is_some() {
            let topic = lesson.topic.as_deref().unwrap_or("general conversation");
            push_unique(&mut self.conversation_topics_practiced, topic);
            record.topics_covered.push(topic.to_string());
        }

        self.lessons_completed.push(record);
        self.progress_history.push(HistoryEntry {
            date: now,
            level: self.current_level,
            streak: self.learning_streak,
            total_words: self.vocabulary_learned.len(),
            total_grammar: self.grammar_patterns_mastered.len(),
        });

        self.check_promotion()
    }

    /// Move up one level once every threshold of the current level is met.
    pub fn check_promotion(&mut self) -> Option<Level> {
        let threshold = promotion_threshold(self.current_level)?;

        if self.vocabulary_learned.len() >= threshold.vocabulary
            && self.grammar_patterns_mastered.len() >= threshold.grammar
            && self.total_sessions >= threshold.sessions
        {
            let previous = self.current_level;
            let next = previous.next()?;
            self.current_level = next;
            info!("Learner progressed from {} to {}", previous, next);
            return Some(next);
        }

        None
    }

    /// The `n` most recently learned words, oldest first.
    pub fn recent_words(&self, n: usize) -> Vec<&str> {
        let mut words: Vec<(&String, &LearnedWord)> = self.vocabulary_learned.iter().collect();
        words.sort_by(|a, b| a.1.learned_date.cmp(&b.1.learned_date).then(a.0.cmp(b.0)));
        let skip = words.len().saturating_sub(n);
        words.into_iter().skip(skip).map(|(w, _)| w.as_str()).collect()
    }
}
