//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.lehrer.toml` files.

use crate::cli::Args;
use crate::models::Level;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = ".lehrer.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Chat-completion model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Dictionary lookup settings.
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Speech synthesis settings.
    #[serde(default)]
    pub tts: TtsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Learner identifier stored in the progress file.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Directory holding `user_progress.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory receiving generated audio.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Level used when neither `--level` nor a progress file says otherwise.
    #[serde(default)]
    pub level: Level,

    /// Level a fresh learner aims for.
    #[serde(default = "default_target_level")]
    pub target_level: Level,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            data_dir: default_data_dir(),
            audio_dir: default_audio_dir(),
            level: Level::A1,
            target_level: default_target_level(),
            verbose: false,
        }
    }
}

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio_cache")
}

fn default_target_level() -> Level {
    Level::B2
}

/// Chat-completion (OpenAI-compatible) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL (without `/chat/completions`).
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum tokens in a response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for grammar analysis.
    #[serde(default = "default_grammar_temperature")]
    pub grammar_temperature: f32,

    /// Temperature for conversation practice.
    #[serde(default = "default_conversation_temperature")]
    pub conversation_temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            grammar_temperature: default_grammar_temperature(),
            conversation_temperature: default_conversation_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_llm_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_grammar_temperature() -> f32 {
    0.3
}

fn default_conversation_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    60
}

/// Dictionary (Wiktionary REST) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    #[serde(default = "default_dictionary_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Language section picked from definition responses.
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_dictionary_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_dictionary_url(),
            user_agent: default_user_agent(),
            language: default_language(),
            timeout_seconds: default_dictionary_timeout(),
        }
    }
}

fn default_dictionary_url() -> String {
    "https://en.wiktionary.org/api/rest_v1".to_string()
}

fn default_user_agent() -> String {
    format!("lehrer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_language() -> String {
    "de".to_string()
}

fn default_dictionary_timeout() -> u64 {
    20
}

/// Speech synthesis (OpenAI-compatible `/audio/speech`) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_url")]
    pub base_url: String,

    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Default voice.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Playback speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Environment variable holding an optional API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_tts_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_url(),
            model: default_tts_model(),
            voice: default_voice(),
            speed: default_speed(),
            api_key_env: None,
            timeout_seconds: default_tts_timeout(),
        }
    }
}

fn default_tts_url() -> String {
    "http://localhost:5050/v1".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "de-DE-KatjaNeural".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_tts_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge CLI arguments into the configuration (CLI takes precedence).
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(ref url) = args.api_url {
            self.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref dir) = args.data_dir {
            self.general.data_dir = dir.clone();
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Path of the progress record.
    pub fn progress_file(&self) -> PathBuf {
        self.general.data_dir.join("user_progress.json")
    }

    /// Read the chat API key from the configured environment variable.
    pub fn llm_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    /// Read the optional speech API key.
    pub fn tts_api_key(&self) -> Option<String> {
        self.tts
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
