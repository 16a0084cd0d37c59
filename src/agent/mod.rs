//! Tutoring agents.
//!
//! Each agent wraps one external service behind a prompt or lookup and
//! folds the outcome into a [`StepOutcome`](crate::models::StepOutcome):
//! - Grammar master: LLM grammar breakdown
//! - Vocabulary builder: dictionary lookup plus word-shape heuristics
//! - Conversation partner: LLM conversation turn with corrections

pub mod conversation;
pub mod grammar;
pub mod vocabulary;

pub use conversation::ConversationPartner;
pub use grammar::GrammarMaster;
pub use vocabulary::VocabularyBuilder;
