//! Audio cache management around a [`SpeechBackend`].
//!
//! Every request writes a new file named `de_<timestamp>_<hash>.mp3`, with a
//! `_<n>` suffix when that name is already taken. There is no lookup of
//! earlier files for the same text. The directory is pruned on demand with
//! [`SpeechHelper::cleanup_old_audio`].

use crate::error::{TutorError, TutorResult};
use crate::speech::backend::SpeechBackend;
use chrono::{Local, NaiveDateTime};
use futures::future::join_all;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A German voice offered by the speech service.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Voice {
    pub key: &'static str,
    pub voice: &'static str,
    pub description: &'static str,
    pub region: &'static str,
    pub style: &'static str,
}

const VOICES: [Voice; 6] = [
    Voice {
        key: "female_standard",
        voice: "de-DE-KatjaNeural",
        description: "Female German voice (Standard German)",
        region: "Germany",
        style: "Friendly, clear, natural",
    },
    Voice {
        key: "male_standard",
        voice: "de-DE-ConradNeural",
        description: "Male German voice (Standard German)",
        region: "Germany",
        style: "Professional, clear, authoritative",
    },
    Voice {
        key: "female_austria",
        voice: "de-AT-IngridNeural",
        description: "Female Austrian German voice",
        region: "Austria",
        style: "Austrian accent, friendly",
    },
    Voice {
        key: "male_austria",
        voice: "de-AT-JonasNeural",
        description: "Male Austrian German voice",
        region: "Austria",
        style: "Austrian accent, professional",
    },
    Voice {
        key: "female_swiss",
        voice: "de-CH-LeniNeural",
        description: "Female Swiss German voice",
        region: "Switzerland",
        style: "Swiss accent, warm",
    },
    Voice {
        key: "male_swiss",
        voice: "de-CH-JanNeural",
        description: "Male Swiss German voice",
        region: "Switzerland",
        style: "Swiss accent, clear",
    },
];

pub fn available_voices() -> &'static [Voice] {
    &VOICES
}

/// Size of the audio directory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudioStats {
    pub file_count: usize,
    pub total_bytes: u64,
    pub total_size_kb: f64,
    pub total_size_mb: f64,
}

pub struct SpeechHelper {
    backend: Arc<dyn SpeechBackend>,
    audio_dir: PathBuf,
    voice: String,
}

impl SpeechHelper {
    pub fn new(backend: Arc<dyn SpeechBackend>, audio_dir: PathBuf, voice: String) -> Self {
        Self {
            backend,
            audio_dir,
            voice,
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Synthesize `text` and save it; `voice` overrides the configured one.
    pub async fn generate_speech(&self, text: &str, voice: Option<&str>) -> TutorResult<PathBuf> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TutorError::EmptyInput);
        }

        let voice = voice.unwrap_or(self.voice.as_str());
        let preview: String = text.chars().take(50).collect();
        info!("Generating speech ({}): '{}'", voice, preview);

        let audio = self.backend.synthesize(text, voice).await?;

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let name = audio_file_name(text, Local::now().naive_local());
        let path = write_new_file(&self.audio_dir, &name, &audio).await?;

        debug!("Saved {} bytes to {}", audio.len(), path.display());
        Ok(path)
    }

    /// Synthesize several texts concurrently, one result per text.
    pub async fn generate_multiple(
        &self,
        texts: &[String],
        voice: Option<&str>,
    ) -> Vec<TutorResult<PathBuf>> {
        join_all(texts.iter().map(|t| self.generate_speech(t, voice))).await
    }

    /// Keep the `max_files` newest files and delete the rest.
    pub fn cleanup_old_audio(&self, max_files: usize) -> TutorResult<usize> {
        let mut files = self.audio_files();
        if files.len() <= max_files {
            return Ok(0);
        }

        files.sort_by(|a, b| b.1.cmp(&a.1));
        let stale = &files[max_files..];
        for (path, _, _) in stale {
            fs::remove_file(path)?;
        }

        info!("Cleaned up {} old audio files", stale.len());
        Ok(stale.len())
    }

    pub fn clear_all_audio(&self) -> TutorResult<usize> {
        let files = self.audio_files();
        for (path, _, _) in &files {
            fs::remove_file(path)?;
        }
        info!("Cleared {} audio files", files.len());
        Ok(files.len())
    }

    pub fn audio_stats(&self) -> AudioStats {
        let files = self.audio_files();
        let total_bytes: u64 = files.iter().map(|(_, _, size)| size).sum();

        AudioStats {
            file_count: files.len(),
            total_bytes,
            total_size_kb: total_bytes as f64 / 1024.0,
            total_size_mb: total_bytes as f64 / (1024.0 * 1024.0),
        }
    }

    /// `.mp3` files directly inside the audio directory with mtime and size.
    fn audio_files(&self) -> Vec<(PathBuf, SystemTime, u64)> {
        if !self.audio_dir.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&self.audio_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|x| x == "mp3").unwrap_or(false))
            .filter_map(|e| match e.metadata() {
                Ok(meta) => Some((
                    e.path().to_path_buf(),
                    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    meta.len(),
                )),
                Err(err) => {
                    warn!("Cannot stat {}: {}", e.path().display(), err);
                    None
                }
            })
            .collect()
    }
}

/// `de_<YYYYmmdd_HHMMSS>_<first 8 hex of sha256(text)>.mp3`
pub fn audio_file_name(text: &str, at: NaiveDateTime) -> String {
    let hash = format!("{:x}", Sha256::digest(text.as_bytes()));
    format!("de_{}_{}.mp3", at.format("%Y%m%d_%H%M%S"), &hash[..8])
}

/// Write `bytes` under `name`, or `<stem>_<n>.mp3` if the name is taken.
async fn write_new_file(dir: &Path, name: &str, bytes: &[u8]) -> TutorResult<PathBuf> {
    let stem = name.trim_end_matches(".mp3");
    let mut attempt = 0u32;
    loop {
        let path = if attempt == 0 {
            dir.join(name)
        } else {
            dir.join(format!("{}_{}.mp3", stem, attempt))
        };

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
