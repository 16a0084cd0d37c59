//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Level;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lehrer - LLM-powered German tutor
///
/// Analyze German sentences for grammar and vocabulary, practice
/// conversations, and follow a daily lesson plan that adapts to your
/// progress through the CEFR levels.
///
/// Examples:
///   lehrer analyze "Ich möchte ein Fahrzeug kaufen."
///   lehrer --level B1 chat "Hallo! Ich bin müde heute." --topic "daily life"
///   lehrer word Krankenhaus
///   lehrer lesson
///   lehrer speak "Guten Tag! Wie geht es Ihnen?"
///   lehrer init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .lehrer.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// CEFR level to work at (A1-C2)
    ///
    /// Defaults to the level stored in your progress file.
    #[arg(short, long, value_name = "LEVEL", value_parser = parse_level, global = true)]
    pub level: Option<Level>,

    /// Chat model to use
    #[arg(short, long, env = "LEHRER_MODEL", global = true)]
    pub model: Option<String>,

    /// Chat-completion API base URL
    #[arg(long, value_name = "URL", env = "LEHRER_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the progress file
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the full lesson workflow on a German text
    Analyze {
        /// German text to analyze
        text: String,

        /// Learning goal; mentioning conversation/speaking/practice/dialogue
        /// adds a conversation step
        #[arg(short, long, default_value = "general learning")]
        goal: String,

        /// Conversation topic
        #[arg(long)]
        topic: Option<String>,

        /// Conversation scenario
        #[arg(long)]
        scenario: Option<String>,

        #[command(flatten)]
        output: OutputArgs,

        /// Do not record the lesson in the progress file
        #[arg(long)]
        no_track: bool,

        /// Synthesize audio for the conversation reply
        #[arg(long)]
        speak: bool,
    },

    /// Practice conversation with the German partner
    Chat {
        /// Your message in German
        message: String,

        /// Conversation topic
        #[arg(long)]
        topic: Option<String>,

        /// Conversation scenario
        #[arg(long)]
        scenario: Option<String>,

        #[command(flatten)]
        output: OutputArgs,

        /// Do not record the lesson in the progress file
        #[arg(long)]
        no_track: bool,

        /// Synthesize audio for the partner's reply
        #[arg(long)]
        speak: bool,
    },

    /// Analyze a single word (compound structure, level, definitions)
    Word {
        /// German word
        word: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show today's personalized lesson plan
    Lesson {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show learning progress
    Progress {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List conversation starters for the level
    Starters,

    /// Show the Goethe syllabus for the level
    Syllabus,

    /// Show definite-article declension tables and case explanations
    Articles {
        /// masculine, feminine, neuter or plural (all when omitted)
        #[arg(long)]
        gender: Option<String>,
    },

    /// Synthesize German speech into the audio directory
    Speak {
        /// Texts to speak; several texts are synthesized concurrently
        #[arg(required = true)]
        texts: Vec<String>,

        /// Voice to use
        #[arg(long)]
        voice: Option<String>,
    },

    /// List the available German voices
    Voices,

    /// Manage generated audio files
    Audio {
        #[command(subcommand)]
        action: AudioAction,
    },

    /// Generate a default .lehrer.toml configuration file
    InitConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AudioAction {
    /// Show file count and size of the audio directory
    Stats,
    /// Delete all but the newest audio files
    Cleanup {
        /// Number of files to keep
        #[arg(long, default_value = "50")]
        keep: usize,
    },
    /// Delete every audio file
    Clear,
}

/// Output selection shared by report-producing commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse::<Level>().map_err(|e| e.to_string())
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match &self.command {
            Command::Analyze { text, .. } if text.trim().is_empty() => {
                Err("Text to analyze must not be empty".to_string())
            }
            Command::Chat { message, .. } if message.trim().is_empty() => {
                Err("Message must not be empty".to_string())
            }
            Command::Word { word, .. } if word.trim().is_empty() || word.contains(' ') => {
                Err("Word must be a single non-empty word".to_string())
            }
            Command::Speak { texts, .. } if texts.iter().any(|t| t.trim().is_empty()) => {
                Err("Texts to speak must not be empty".to_string())
            }
            Command::Audio {
                action: AudioAction::Cleanup { keep },
            } if *keep == 0 => Err("Use `audio clear` to delete every file".to_string()),
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            config: None,
            level: None,
            model: None,
            api_url: None,
            data_dir: None,
            timeout: None,
            verbose: false,
            quiet: false,
            command,
        }
    }

    #[test]
    fn test_parse_analyze() {
        let args = Args::try_parse_from([
            "lehrer",
            "--level",
            "b1",
            "analyze",
            "Das ist mein Haus.",
            "--goal",
            "conversation practice",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.level, Some(Level::B1));
        match args.command {
            Command::Analyze {
                text, goal, output, ..
            } => {
                assert_eq!(text, "Das ist mein Haus.");
                assert_eq!(goal, "conversation practice");
                assert_eq!(output.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_level() {
        assert!(Args::try_parse_from(["lehrer", "--level", "Z3", "lesson"]).is_err());
    }

    #[test]
    fn test_parse_audio_cleanup() {
        let args = Args::try_parse_from(["lehrer", "audio", "cleanup", "--keep", "3"]).unwrap();
        match args.command {
            Command::Audio {
                action: AudioAction::Cleanup { keep },
            } => assert_eq!(keep, 3),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::Starters);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_text() {
        let args = make_args(Command::Analyze {
            text: "   ".to_string(),
            goal: "general learning".to_string(),
            topic: None,
            scenario: None,
            output: OutputArgs::default(),
            no_track: false,
            speak: false,
        });
        assert!(args.validate().is_err());

        let args = make_args(Command::Word {
            word: "zwei Wörter".to_string(),
            output: OutputArgs::default(),
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args(Command::Lesson {
            output: OutputArgs::default(),
        });
        args.api_url = Some("api.groq.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::Voices);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
