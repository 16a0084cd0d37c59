//! Routing of a lesson request through the tutoring agents.
//!
//! Steps run sequentially over one [`LearningState`]:
//! analyze -> grammar -> vocabulary -> conversation -> synthesize,
//! skipping whatever the request does not need. A failing agent never
//! stops the run; its outcome is kept and the next step proceeds.

use crate::agent::{ConversationPartner, GrammarMaster, VocabularyBuilder};
use crate::error::{TutorError, TutorResult};
use crate::models::{
    ConversationContext, ConversationResponse, GrammarAnalysis, Lesson, Level, StepOutcome,
    VocabularyAnalysis,
};
use crate::workflow::synthesizer::synthesize_lesson;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Goal keywords that ask for a conversation turn.
const CONVERSATION_GOALS: [&str; 4] = ["conversation", "speaking", "practice", "dialogue"];

/// Tokens longer than this many characters count as complex.
const COMPLEX_WORD_MIN_CHARS: usize = 6;

/// What the learner asked for.
#[derive(Debug, Clone, Serialize)]
pub struct LessonRequest {
    pub text: String,
    pub level: Level,
    pub goal: String,
    pub context: ConversationContext,
}

impl LessonRequest {
    pub fn new(text: impl Into<String>, level: Level) -> Self {
        Self {
            text: text.into(),
            level,
            goal: "general learning".to_string(),
            context: ConversationContext::default(),
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }
}

/// Nodes of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Analyze,
    Grammar,
    Vocabulary,
    Conversation,
    Synthesize,
    Done,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Analyze => "analyze",
            Step::Grammar => "grammar",
            Step::Vocabulary => "vocabulary",
            Step::Conversation => "conversation",
            Step::Synthesize => "synthesize",
            Step::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Vocabulary outcome for one complex word.
#[derive(Debug, Clone, Serialize)]
pub struct WordOutcome {
    pub word: String,
    pub outcome: StepOutcome<VocabularyAnalysis>,
}

/// Shared state threaded through every step.
#[derive(Debug, Clone, Serialize)]
pub struct LearningState {
    pub request: LessonRequest,
    pub needs_grammar: bool,
    pub needs_vocabulary: bool,
    pub needs_conversation: bool,
    /// Ordered, without duplicates.
    pub complex_words: Vec<String>,
    pub grammar: Option<StepOutcome<GrammarAnalysis>>,
    pub vocabulary: Vec<WordOutcome>,
    pub conversation: Option<StepOutcome<ConversationResponse>>,
    /// Steps visited, in order.
    pub trace: Vec<Step>,
    pub lesson: Option<Lesson>,
}

impl LearningState {
    pub fn new(request: LessonRequest) -> Self {
        Self {
            request,
            needs_grammar: false,
            needs_vocabulary: false,
            needs_conversation: false,
            complex_words: Vec::new(),
            grammar: None,
            vocabulary: Vec::new(),
            conversation: None,
            trace: Vec::new(),
            lesson: None,
        }
    }

    pub fn grammar_analysis(&self) -> Option<&GrammarAnalysis> {
        self.grammar.as_ref().and_then(|o| o.value())
    }

    /// Successfully analyzed words, in analysis order.
    pub fn analyzed_words(&self) -> impl Iterator<Item = &VocabularyAnalysis> {
        self.vocabulary.iter().filter_map(|w| w.outcome.value())
    }

    pub fn conversation_response(&self) -> Option<&ConversationResponse> {
        self.conversation.as_ref().and_then(|o| o.value())
    }

    /// Error messages of every step that failed.
    pub fn errors(&self) -> Vec<String> {
        let grammar = self.grammar.as_ref().and_then(|o| o.error.clone());
        let vocabulary = self
            .vocabulary
            .iter()
            .filter_map(|w| w.outcome.error.as_ref().map(|e| format!("{}: {}", w.word, e)));
        let conversation = self.conversation.as_ref().and_then(|o| o.error.clone());

        grammar
            .into_iter()
            .chain(vocabulary)
            .chain(conversation)
            .collect()
    }

    fn add_complex_word(&mut self, word: &str) -> bool {
        if self.complex_words.iter().any(|w| w == word) {
            return false;
        }
        self.complex_words.push(word.to_string());
        true
    }
}

/// Pick the step that follows `current`.
pub fn next_step(current: Step, state: &LearningState) -> Step {
    match current {
        Step::Analyze if state.needs_grammar => Step::Grammar,
        Step::Analyze | Step::Grammar if state.needs_vocabulary => Step::Vocabulary,
        Step::Analyze | Step::Grammar | Step::Vocabulary if state.needs_conversation => {
            Step::Conversation
        }
        Step::Analyze | Step::Grammar | Step::Vocabulary | Step::Conversation => Step::Synthesize,
        Step::Synthesize | Step::Done => Step::Done,
    }
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_complex(word: &str) -> bool {
    word.chars().count() > COMPLEX_WORD_MIN_CHARS || word.chars().skip(1).any(char::is_uppercase)
}

/// Tokens worth a vocabulary lookup: long words and words with inner capitals.
pub fn find_complex_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for token in text.split_whitespace() {
        let word = trim_token(token);
        if !word.is_empty() && is_complex(word) && !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

pub fn wants_conversation(goal: &str) -> bool {
    let goal = goal.to_lowercase();
    CONVERSATION_GOALS.iter().any(|g| goal.contains(g))
}

/// Runs the agents for one request at a time.
pub struct Orchestrator {
    grammar: GrammarMaster,
    vocabulary: VocabularyBuilder,
    conversation: ConversationPartner,
}

impl Orchestrator {
    pub fn new(
        grammar: GrammarMaster,
        vocabulary: VocabularyBuilder,
        conversation: ConversationPartner,
    ) -> Self {
        Self {
            grammar,
            vocabulary,
            conversation,
        }
    }

    /// Run the whole workflow and return the final state.
    ///
    /// Only an empty text is rejected; agent failures are recorded in the
    /// state and the lesson is built from what succeeded.
    pub async fn orchestrate(&mut self, request: LessonRequest) -> TutorResult<LearningState> {
        if request.text.trim().is_empty() {
            return Err(TutorError::EmptyInput);
        }

        info!(
            "Starting lesson workflow ({}, goal: {})",
            request.level, request.goal
        );

        let mut state = LearningState::new(request);
        let mut step = Step::Analyze;

        while step != Step::Done {
            debug!("Workflow step: {}", step);
            state.trace.push(step);

            match step {
                Step::Analyze => analyze_input(&mut state),
                Step::Grammar => self.run_grammar(&mut state).await,
                Step::Vocabulary => self.run_vocabulary(&mut state).await,
                Step::Conversation => self.run_conversation(&mut state).await,
                Step::Synthesize => {
                    let lesson = synthesize_lesson(&state, Utc::now());
                    info!("Lesson ready with {} plan steps", lesson.learning_plan.len());
                    state.lesson = Some(lesson);
                }
                Step::Done => break,
            }

            step = next_step(step, &state);
        }

        Ok(state)
    }

    async fn run_grammar(&self, state: &mut LearningState) {
        let outcome = self
            .grammar
            .analyze(&state.request.text, state.request.level)
            .await;

        if let Some(analysis) = outcome.value() {
            let mut added = Vec::new();
            for noun in &analysis.nouns {
                let word = trim_token(&noun.word);
                if word.chars().count() > COMPLEX_WORD_MIN_CHARS && state.add_complex_word(word) {
                    added.push(word.to_string());
                }
            }
            if !added.is_empty() {
                info!("Grammar analysis found more complex words: {}", added.join(", "));
                state.needs_vocabulary = true;
            }
        }

        state.grammar = Some(outcome);
    }

    async fn run_vocabulary(&self, state: &mut LearningState) {
        for word in state.complex_words.clone() {
            let outcome = self.vocabulary.analyze(&word, state.request.level).await;
            state.vocabulary.push(WordOutcome { word, outcome });
        }
        info!("Vocabulary analysis done for {} words", state.vocabulary.len());
    }

    async fn run_conversation(&mut self, state: &mut LearningState) {
        let mut context = state.request.context.clone();
        context.grammar_focus = state
            .grammar_analysis()
            .map(|g| g.level_appropriate_tip.clone())
            .filter(|tip| !tip.is_empty());
        context.vocabulary_focus = state.analyzed_words().map(|v| v.word.clone()).collect();

        let outcome = self
            .conversation
            .practice(&state.request.text, state.request.level, &context)
            .await;
        state.conversation = Some(outcome);
    }
}

fn analyze_input(state: &mut LearningState) {
    state.needs_grammar = true;
    state.complex_words = find_complex_words(&state.request.text);
    state.needs_vocabulary = !state.complex_words.is_empty();
    state.needs_conversation = wants_conversation(&state.request.goal);

    info!(
        "Plan: grammar={}, vocabulary={} ({} complex words), conversation={}",
        state.needs_grammar,
        state.needs_vocabulary,
        state.complex_words.len(),
        state.needs_conversation
    );
}
