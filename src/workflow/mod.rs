//! Lesson workflow.
//!
//! The orchestrator decides which agents a request needs, runs them one
//! after another over a shared [`LearningState`], and the synthesizer folds
//! whatever succeeded into a [`Lesson`](crate::models::Lesson).

pub mod orchestrator;
pub mod synthesizer;

pub use orchestrator::{find_complex_words, LearningState, LessonRequest, Orchestrator, Step};
pub use synthesizer::{build_learning_plan, synthesize_lesson};
