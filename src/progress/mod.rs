//! Learner progress: the persisted record, the tracker that updates it
//! after each lesson, and the daily lesson plan derived from it.

pub mod daily;
pub mod record;
pub mod tracker;

pub use daily::{daily_lesson, DailyLesson, FocusArea};
pub use record::{LessonKind, UserProgress};
pub use tracker::ProgressTracker;
