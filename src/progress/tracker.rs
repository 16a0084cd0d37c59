//! JSON persistence of [`UserProgress`].

use crate::error::TutorResult;
use crate::models::{Lesson, Level};
use crate::progress::daily::{daily_lesson, DailyLesson};
use crate::progress::record::{LessonKind, UserProgress};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads and writes one learner's progress file.
pub struct ProgressTracker {
    path: PathBuf,
    user_id: String,
    target_level: Level,
}

impl ProgressTracker {
    pub fn new(path: PathBuf, user_id: impl Into<String>, target_level: Level) -> Self {
        Self {
            path,
            user_id: user_id.into(),
            target_level,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, creating it when missing.
    ///
    /// A file that cannot be read as progress is replaced with a fresh one.
    pub fn load(&self) -> TutorResult<UserProgress> {
        if !self.path.exists() {
            info!("Creating progress file at {}", self.path.display());
            return self.reset();
        }

        match self.read() {
            Ok(progress) => {
                debug!(
                    "Loaded progress for {} ({} sessions)",
                    progress.user_id, progress.total_sessions
                );
                Ok(progress)
            }
            Err(e) => {
                warn!(
                    "Progress file {} is unreadable ({}); starting a new record",
                    self.path.display(),
                    e
                );
                self.reset()
            }
        }
    }

    pub fn save(&self, progress: &UserProgress) -> TutorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(progress)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Record a finished lesson and persist the result.
    pub fn record_lesson(
        &self,
        lesson: &Lesson,
        kind: LessonKind,
        now: DateTime<Utc>,
    ) -> TutorResult<UserProgress> {
        let mut progress = self.load()?;

        if let Some(level) = progress.apply_lesson(lesson, kind, now) {
            info!("Congratulations! Progressed to {}", level);
        }

        self.save(&progress)?;
        info!(
            "Lesson tracked: session {}, streak {}",
            progress.total_sessions, progress.learning_streak
        );
        Ok(progress)
    }

    pub fn daily_lesson(&self, now: DateTime<Utc>) -> TutorResult<DailyLesson> {
        let progress = self.load()?;
        Ok(daily_lesson(&progress, now))
    }

    fn read(&self) -> TutorResult<UserProgress> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn reset(&self) -> TutorResult<UserProgress> {
        let progress = UserProgress::new(self.user_id.clone(), self.target_level, Utc::now());
        self.save(&progress)?;
        Ok(progress)
    }
}
