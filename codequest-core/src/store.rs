//! Durable learner-profile storage.
//!
//! One versioned JSON document per learner key, in a flat directory.
//! Supports read-by-key, atomic write-by-key (full replace), and key
//! enumeration via cheap metadata peeks.

use crate::difficulty::DifficultyController;
use crate::profile::{now_secs, LearnerId, LearnerProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current profile document version.
const SAVE_VERSION: u32 = 1;

/// The persisted per-learner document.
///
/// Bundles the profile with its difficulty-controller state so a reload
/// resumes recommendations exactly where the learner left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProfile {
    /// Document format version for compatibility checking.
    pub version: u32,

    /// Epoch seconds when the document was written.
    pub saved_at: u64,

    /// The complete learner profile.
    pub profile: LearnerProfile,

    /// Per-topic difficulty windows.
    pub difficulty: DifficultyController,

    /// Quick-access metadata (duplicated for peek access).
    pub metadata: ProfileMetadata,
}

/// Metadata about a saved profile, readable without the full document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Learner key.
    pub learner_id: LearnerId,

    /// Overall level at save time.
    pub level: u32,

    /// Total XP at save time.
    pub total_xp: u64,

    /// Achievements unlocked so far.
    pub achievements: usize,

    /// Outcomes retained in the history window.
    pub quests_recorded: usize,
}

impl SavedProfile {
    /// Wrap a profile and its difficulty state for persistence.
    pub fn new(profile: LearnerProfile, difficulty: DifficultyController) -> Self {
        let metadata = ProfileMetadata {
            learner_id: profile.learner_id.clone(),
            level: profile.level,
            total_xp: profile.total_xp,
            achievements: profile.achievements.len(),
            quests_recorded: profile.history.len(),
        };

        Self {
            version: SAVE_VERSION,
            saved_at: now_secs(),
            profile,
            difficulty,
            metadata,
        }
    }
}

/// Directory-backed profile storage, one JSON file per learner.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    /// Open a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { root: dir.into() }
    }

    /// Path of the document for a learner key.
    pub fn path_for(&self, learner_id: &LearnerId) -> PathBuf {
        let sanitized = learner_id
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>();
        self.root.join(format!("{sanitized}.json"))
    }

    /// Load a learner's document, or `None` if the learner is unknown.
    pub async fn load(&self, learner_id: &LearnerId) -> Result<Option<SavedProfile>, StoreError> {
        let path = self.path_for(learner_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let saved: SavedProfile = serde_json::from_str(&content)?;
        if saved.version != SAVE_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        tracing::debug!(learner = %learner_id, "loaded profile");
        Ok(Some(saved))
    }

    /// Write a learner's document, replacing any previous one.
    ///
    /// The document is written to a temporary sibling and renamed into
    /// place, so readers never observe a partial write.
    pub async fn save(&self, saved: &SavedProfile) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;

        let path = self.path_for(&saved.profile.learner_id);
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(saved)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(learner = %saved.profile.learner_id, "saved profile");
        Ok(())
    }

    /// Enumerate all stored learners via metadata peeks.
    ///
    /// Unreadable or foreign files in the directory are skipped.
    pub async fn list_learners(&self) -> Result<Vec<ProfileMetadata>, StoreError> {
        let mut learners = Vec::new();

        if !self.root.exists() {
            return Ok(learners);
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(metadata) = peek_metadata(&path).await {
                    learners.push(metadata);
                }
            }
        }

        learners.sort_by(|a, b| a.learner_id.as_str().cmp(b.learner_id.as_str()));
        Ok(learners)
    }
}

/// Read just the metadata block of a document.
async fn peek_metadata(path: impl AsRef<Path>) -> Result<ProfileMetadata, StoreError> {
    let content = fs::read_to_string(path).await?;

    #[derive(Deserialize)]
    struct Partial {
        version: u32,
        metadata: ProfileMetadata,
    }

    let partial: Partial = serde_json::from_str(&content)?;
    if partial.version != SAVE_VERSION {
        return Err(StoreError::VersionMismatch {
            expected: SAVE_VERSION,
            found: partial.version,
        });
    }

    Ok(partial.metadata)
}
