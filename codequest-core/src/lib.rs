//! Progression engine for a gamified coding mentor.
//!
//! This crate provides:
//! - Persistent per-learner profiles with XP, levels, and quest history
//! - Deterministic rubric scoring with difficulty multipliers
//! - An achievement catalogue evaluated over learner history
//! - Adaptive difficulty recommendations from rolling success rates
//! - A session layer orchestrating the quest cycle with atomic persistence
//!
//! Dialogue generation, challenge authoring, and code analysis live
//! outside this crate; it consumes parsed commands and pre-graded
//! rubrics, and produces state transitions and recommendations.
//!
//! # Quick Start
//!
//! ```ignore
//! use codequest_core::{
//!     LearnerId, ProfileStore, ProgressionConfig, ProgressionService, Rubric, Submission,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ProgressionService::new(
//!         ProfileStore::new("profiles"),
//!         ProgressionConfig::default(),
//!     );
//!
//!     let ada = LearnerId::new("ada");
//!     let quest = service.start_quest(&ada, "recursion", "rust", None).await?;
//!     println!("issued {} at {}", quest.id, quest.tier);
//!
//!     let result = service
//!         .submit_solution(&ada, Submission::new(Rubric::new(20, 25, 15, 10, 5)))
//!         .await?;
//!     println!("awarded {} XP, now level {}", result.awarded_xp, result.new_level);
//!     Ok(())
//! }
//! ```

pub mod achievements;
pub mod difficulty;
pub mod profile;
pub mod scoring;
pub mod service;
pub mod session;
pub mod store;
pub mod testing;

// Primary public API
pub use achievements::{evaluate, get_achievement, AchievementDef, AchievementTier, ProfileStats};
pub use difficulty::{DifficultyConfig, DifficultyController};
pub use profile::{
    DifficultyTier, LanguageProgress, LearnerId, LearnerProfile, LevelCurve, OutcomeKind, Quest,
    QuestId, QuestOutcome, SkillLevel,
};
pub use scoring::{score, Rubric, ScoreError};
pub use service::ProgressionService;
pub use session::{
    HintPayload, ProgressionConfig, ProgressionSession, SessionError, Submission, SubmissionResult,
};
pub use store::{ProfileMetadata, ProfileStore, SavedProfile, StoreError};
