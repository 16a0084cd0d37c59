//! Lehrer - LLM-powered German tutor
//!
//! A CLI that analyzes German text with a chat model, looks words up in
//! Wiktionary, plays conversation partner and keeps a local learning record.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing API key, network failure, bad config, etc.)

mod agent;
mod cli;
mod config;
mod curriculum;
mod dictionary;
mod error;
mod llm;
mod models;
mod progress;
mod report;
mod speech;
mod workflow;

use agent::grammar::{article_table, GENDERS};
use agent::{ConversationPartner, GrammarMaster, VocabularyBuilder};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, AudioAction, Command, OutputArgs, OutputFormat};
use config::{Config, CONFIG_FILE};
use dictionary::WiktionaryClient;
use error::TutorError;
use indicatif::{ProgressBar, ProgressStyle};
use llm::{ChatModel, OpenAiCompatibleClient};
use models::{ConversationContext, Level};
use progress::{LessonKind, ProgressTracker};
use speech::{available_voices, HttpSpeechBackend, SpeechHelper};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use workflow::{synthesize_lesson, LearningState, LessonRequest, Orchestrator};

/// Where the configuration came from, reported once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Unreadable(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // No logging or config needed
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    let (mut config, source) = load_config(&args)?;
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("Lehrer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Unreadable(e) => warn!("Failed to load config: {}", e),
    }

    if let Err(e) = run(args, config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle `init-config`: write a default `.lehrer.toml`.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to choose your model, level, voice and data directory.");
    Ok(())
}

/// Logs go to stderr so rendered lessons on stdout stay clean.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };
    let directives = format!("{},hyper=warn,reqwest=warn", level.as_str().to_lowercase());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Explicit `--config` must load; the default file falls back to defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(format!("{:#}", e)))),
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let tracker = ProgressTracker::new(
        config.progress_file(),
        config.general.user_id.clone(),
        config.general.target_level,
    );

    match args.command.clone() {
        Command::Analyze {
            text,
            goal,
            topic,
            scenario,
            output,
            no_track,
            speak,
        } => {
            let level = resolve_level(&args, &config, &tracker)?;
            let model = chat_model(&config)?;
            let dictionary = Arc::new(WiktionaryClient::new(&config.dictionary)?);

            let mut orchestrator = Orchestrator::new(
                GrammarMaster::new(
                    model.clone(),
                    config.llm.grammar_temperature,
                    config.llm.max_tokens,
                ),
                VocabularyBuilder::new(dictionary),
                ConversationPartner::new(
                    model,
                    config.llm.conversation_temperature,
                    config.llm.max_tokens,
                ),
            );

            let request = LessonRequest::new(text, level)
                .with_goal(goal)
                .with_context(ConversationContext::new(topic, scenario));

            let spinner = spinner(&args, format!("Building your {} lesson...", level));
            let state = orchestrator.orchestrate(request).await;
            spinner.finish_and_clear();
            let state = state?;

            for e in state.errors() {
                warn!("{}", e);
            }

            let lesson = state
                .lesson
                .as_ref()
                .context("Workflow finished without a lesson")?;

            let rendered = match output.format {
                OutputFormat::Markdown => {
                    report::generate_lesson_markdown(lesson, state.grammar_analysis())
                }
                OutputFormat::Json => report::generate_json(lesson)?,
            };
            emit(&rendered, &output)?;

            if !no_track {
                track(&tracker, lesson, LessonKind::Comprehensive);
            }

            if speak {
                match state.conversation_response() {
                    Some(reply) => speak_reply(&config, &reply.german_response).await,
                    None => warn!("Nothing to speak: the lesson has no conversation reply"),
                }
            }
        }

        Command::Chat {
            message,
            topic,
            scenario,
            output,
            no_track,
            speak,
        } => {
            let level = resolve_level(&args, &config, &tracker)?;
            let model = chat_model(&config)?;
            let mut partner = ConversationPartner::new(
                model,
                config.llm.conversation_temperature,
                config.llm.max_tokens,
            );
            let context = ConversationContext::new(topic, scenario);

            let spinner = spinner(&args, "Thinking of a reply...");
            let outcome = partner.practice(&message, level, &context).await;
            spinner.finish_and_clear();

            let Some(reply) = outcome.value().cloned() else {
                bail!(
                    "{}",
                    outcome
                        .error
                        .clone()
                        .unwrap_or_else(|| "Conversation failed".to_string())
                );
            };

            let rendered = match output.format {
                OutputFormat::Markdown => report::generate_conversation_markdown(&reply),
                OutputFormat::Json => report::generate_json(&reply)?,
            };
            emit(&rendered, &output)?;

            if !no_track {
                let request = LessonRequest::new(message, level)
                    .with_goal("conversation practice")
                    .with_context(context);
                let mut state = LearningState::new(request);
                state.needs_conversation = true;
                state.conversation = Some(outcome);
                let lesson = synthesize_lesson(&state, Utc::now());
                track(&tracker, &lesson, LessonKind::Conversation);
            }

            if speak {
                speak_reply(&config, &reply.german_response).await;
            }
        }

        Command::Word { word, output } => {
            let level = resolve_level(&args, &config, &tracker)?;
            let builder = VocabularyBuilder::new(Arc::new(WiktionaryClient::new(
                &config.dictionary,
            )?));

            let spinner = spinner(&args, format!("Looking up {}...", word));
            let outcome = builder.analyze(&word, level).await;
            spinner.finish_and_clear();

            let Some(analysis) = outcome.value() else {
                bail!(
                    "{}",
                    outcome
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("Could not analyze '{}'", word))
                );
            };

            let rendered = match output.format {
                OutputFormat::Markdown => report::generate_vocabulary_markdown(analysis),
                OutputFormat::Json => report::generate_json(analysis)?,
            };
            emit(&rendered, &output)?;
        }

        Command::Lesson { output } => {
            let lesson = tracker.daily_lesson(Utc::now())?;
            let rendered = match output.format {
                OutputFormat::Markdown => report::generate_daily_lesson_markdown(&lesson),
                OutputFormat::Json => report::generate_json(&lesson)?,
            };
            emit(&rendered, &output)?;
        }

        Command::Progress { output } => {
            let progress = tracker.load()?;
            let rendered = match output.format {
                OutputFormat::Markdown => report::generate_progress_markdown(&progress),
                OutputFormat::Json => report::generate_json(&progress)?,
            };
            emit(&rendered, &output)?;
        }

        Command::Starters => {
            let level = resolve_level(&args, &config, &tracker)?;
            println!("# Conversation Starters ({})\n", level);
            for starter in ConversationPartner::starters(level) {
                println!("- {}", starter);
            }
        }

        Command::Syllabus => {
            let level = resolve_level(&args, &config, &tracker)?;
            let syllabus = curriculum::syllabus(level);
            print!("{}", report::generate_syllabus_markdown(level, &syllabus));
        }

        Command::Articles { gender } => match gender {
            Some(gender) => {
                if article_table(&gender).is_none() {
                    bail!(
                        "Unknown gender '{}': expected one of {}",
                        gender,
                        GENDERS.join(", ")
                    );
                }
                print!("{}", report::generate_articles_markdown(&[gender.as_str()]));
            }
            None => print!("{}", report::generate_articles_markdown(&GENDERS)),
        },

        Command::Speak { texts, voice } => {
            let helper = speech_helper(&config)?;

            let spinner = spinner(&args, format!("Synthesizing {} text(s)...", texts.len()));
            let results = helper.generate_multiple(&texts, voice.as_deref()).await;
            spinner.finish_and_clear();

            let mut failed = 0;
            for (text, result) in texts.iter().zip(results) {
                match result {
                    Ok(path) => println!("🔊 {}", path.display()),
                    Err(e) => {
                        failed += 1;
                        eprintln!("⚠️  Could not speak '{}': {}", text, e);
                    }
                }
            }

            if failed == texts.len() {
                bail!("Speech synthesis failed for every text");
            }
        }

        Command::Voices => {
            print!(
                "{}",
                report::generate_voices_markdown(available_voices(), &config.tts.voice)
            );
        }

        Command::Audio { action } => {
            let helper = speech_helper(&config)?;
            match action {
                AudioAction::Stats => {
                    let stats = helper.audio_stats();
                    print!(
                        "{}",
                        report::generate_audio_stats_markdown(&stats, helper.audio_dir())
                    );
                }
                AudioAction::Cleanup { keep } => {
                    let removed = helper.cleanup_old_audio(keep)?;
                    println!("🧹 Removed {} old audio file(s), kept up to {}.", removed, keep);
                }
                AudioAction::Clear => {
                    let removed = helper.clear_all_audio()?;
                    println!("🗑️  Removed {} audio file(s).", removed);
                }
            }
        }

        Command::InitConfig => handle_init_config()?,
    }

    Ok(())
}

/// `--level` first, then the learner's recorded level, then the config.
fn resolve_level(args: &Args, config: &Config, tracker: &ProgressTracker) -> Result<Level> {
    if let Some(level) = args.level {
        return Ok(level);
    }
    if tracker.path().exists() {
        let progress = tracker.load()?;
        debug!("Using recorded level {}", progress.current_level);
        return Ok(progress.current_level);
    }
    Ok(config.general.level)
}

fn chat_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    let api_key = config
        .llm_api_key()
        .ok_or_else(|| TutorError::MissingApiKey {
            var: config.llm.api_key_env.clone(),
        })?;

    info!("Using {} at {}", config.llm.model, config.llm.base_url);
    Ok(Arc::new(OpenAiCompatibleClient::new(&config.llm, api_key)?))
}

fn speech_helper(config: &Config) -> Result<SpeechHelper> {
    let backend = HttpSpeechBackend::new(&config.tts, config.tts_api_key())?;
    Ok(SpeechHelper::new(
        Arc::new(backend),
        config.general.audio_dir.clone(),
        config.tts.voice.clone(),
    ))
}

/// Speaking is best effort after the lesson has been shown.
async fn speak_reply(config: &Config, text: &str) {
    let helper = match speech_helper(config) {
        Ok(helper) => helper,
        Err(e) => {
            warn!("Speech unavailable: {:#}", e);
            return;
        }
    };

    match helper.generate_speech(text, None).await {
        Ok(path) => println!("🔊 Audio saved to {}", path.display()),
        Err(e) => warn!("Speech synthesis failed: {}", e),
    }
}

/// A failed progress update never hides the lesson already printed.
fn track(tracker: &ProgressTracker, lesson: &models::Lesson, kind: LessonKind) {
    match tracker.record_lesson(lesson, kind, Utc::now()) {
        Ok(progress) => debug!(
            "Progress saved: {} sessions, {} words",
            progress.total_sessions,
            progress.vocabulary_learned.len()
        ),
        Err(e) => warn!("Could not update progress: {}", e),
    }
}

/// Print to stdout, or write to `--output` when given.
fn emit(content: &str, output: &OutputArgs) -> Result<()> {
    match output.output {
        Some(ref path) => {
            report::write_report(content, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Saved to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Spinner on stderr, hidden with `--quiet`.
fn spinner(args: &Args, message: impl Into<String>) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
