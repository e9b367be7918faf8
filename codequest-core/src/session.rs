//! ProgressionSession - one learner's quest cycle.
//!
//! This module orchestrates the interactive loop: quest issuance,
//! hints, submission scoring, achievement checks, difficulty updates,
//! and persistence. The outer state machine is Idle -> QuestActive ->
//! Resolving -> Idle, carried by `active_quest` on the profile.
//!
//! Every mutating operation is failure-atomic: the next state is built
//! on clones, persisted, and only then swapped in. On any error the
//! profile - in memory and on disk - is exactly as it was before.

use crate::achievements;
use crate::difficulty::DifficultyController;
use crate::profile::{
    now_secs, DifficultyTier, LearnerId, LearnerProfile, LevelCurve, OutcomeKind, Quest, QuestId,
    QuestOutcome,
};
use crate::scoring::{self, Rubric, ScoreError};
use crate::store::{ProfileStore, SavedProfile, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a quest is already active for this learner")]
    QuestAlreadyActive,

    #[error("no quest is active for this learner")]
    NoActiveQuest,

    #[error("invalid rubric: {0}")]
    Score(#[from] ScoreError),

    #[error("persistence error: {0}")]
    Store(#[from] StoreError),
}

/// Tunable progression parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// XP deducted per hint, applied on every call.
    pub hint_xp_cost: u64,

    /// XP deducted when a quest is abandoned.
    pub abandon_penalty: u64,

    /// Outcomes retained in the profile's history window.
    pub history_limit: usize,

    /// XP-to-level curve.
    pub level_curve: LevelCurve,

    /// Difficulty-controller tuning.
    pub difficulty: crate::difficulty::DifficultyConfig,
}

impl ProgressionConfig {
    /// Set the per-hint XP cost.
    pub fn with_hint_xp_cost(mut self, cost: u64) -> Self {
        self.hint_xp_cost = cost;
        self
    }

    /// Set the abandonment penalty.
    pub fn with_abandon_penalty(mut self, penalty: u64) -> Self {
        self.abandon_penalty = penalty;
        self
    }

    /// Set the history retention window.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the level curve.
    pub fn with_level_curve(mut self, curve: LevelCurve) -> Self {
        self.level_curve = curve;
        self
    }

    /// Set the difficulty tuning.
    pub fn with_difficulty(mut self, difficulty: crate::difficulty::DifficultyConfig) -> Self {
        self.difficulty = difficulty;
        self
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            hint_xp_cost: 5,
            abandon_penalty: 10,
            history_limit: 100,
            level_curve: LevelCurve::default(),
            difficulty: crate::difficulty::DifficultyConfig::default(),
        }
    }
}

/// A submitted solution: the graded rubric plus upstream analysis tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Graded sub-scores from the quality-analysis collaborator.
    pub rubric: Rubric,

    /// Design-pattern tags flagged upstream.
    pub tags: Vec<String>,
}

impl Submission {
    pub fn new(rubric: Rubric) -> Self {
        Self {
            rubric,
            tags: Vec::new(),
        }
    }

    /// Attach design-pattern tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Result of a scored submission, for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// XP awarded for this solve.
    pub awarded_xp: u64,

    /// Overall level after the award.
    pub new_level: u32,

    /// Achievement ids unlocked by this solve, sorted.
    pub unlocked: Vec<String>,

    /// Recommended tier for the next quest in this topic.
    pub next_recommended_tier: DifficultyTier,
}

/// Result of a hint request, for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintPayload {
    /// Quest the hint counts against.
    pub quest_id: QuestId,

    /// Hints taken on this quest so far, this one included.
    pub hints_used: u32,

    /// XP cost applied by this call.
    pub xp_cost: u64,

    /// Total XP after the deduction.
    pub total_xp: u64,
}

/// One learner's progression session.
///
/// Owns the loaded profile and difficulty state, and persists through
/// the shared [`ProfileStore`]. At most one session should be live per
/// learner at any instant; [`crate::service::ProgressionService`]
/// enforces that discipline.
pub struct ProgressionSession {
    store: Arc<ProfileStore>,
    config: ProgressionConfig,
    profile: LearnerProfile,
    difficulty: DifficultyController,
}

impl ProgressionSession {
    /// Load a learner's session, creating a fresh profile on first contact.
    pub async fn open(
        store: Arc<ProfileStore>,
        config: ProgressionConfig,
        learner_id: LearnerId,
    ) -> Result<Self, SessionError> {
        let (profile, difficulty) = match store.load(&learner_id).await? {
            Some(saved) => (saved.profile, saved.difficulty),
            None => (
                LearnerProfile::new(learner_id),
                DifficultyController::new(config.difficulty),
            ),
        };

        Ok(Self {
            store,
            config,
            profile,
            difficulty,
        })
    }

    /// Issue a new quest, transitioning Idle -> QuestActive.
    ///
    /// The tier comes from the caller's override or from the difficulty
    /// controller's recommendation for the topic.
    pub async fn start_quest(
        &mut self,
        topic: &str,
        language: &str,
        requested_tier: Option<DifficultyTier>,
    ) -> Result<Quest, SessionError> {
        if self.profile.active_quest.is_some() {
            return Err(SessionError::QuestAlreadyActive);
        }

        let tier = requested_tier.unwrap_or_else(|| self.difficulty.recommend(topic));
        let quest = Quest::issue(topic, language, tier);

        let mut next = self.profile.clone();
        next.active_quest = Some(quest.clone());

        self.commit(next, self.difficulty.clone()).await?;
        Ok(quest)
    }

    /// Take a hint against the active quest.
    ///
    /// Each call deducts the configured XP cost again, saturating total
    /// XP at zero, and increments the quest's hint counter.
    pub async fn request_hint(&mut self) -> Result<HintPayload, SessionError> {
        if self.profile.active_quest.is_none() {
            return Err(SessionError::NoActiveQuest);
        }

        let mut next = self.profile.clone();
        next.deduct_xp(self.config.hint_xp_cost);
        if let Some(quest) = next.active_quest.as_mut() {
            quest.hints_used += 1;
        }

        self.commit(next, self.difficulty.clone()).await?;

        let quest = self
            .profile
            .active_quest
            .as_ref()
            .ok_or(SessionError::NoActiveQuest)?;
        Ok(HintPayload {
            quest_id: quest.id,
            hints_used: quest.hints_used,
            xp_cost: self.config.hint_xp_cost,
            total_xp: self.profile.total_xp,
        })
    }

    /// Score a submitted solution and resolve the active quest.
    ///
    /// Runs the full pipeline: scoring, outcome recording, XP and
    /// per-language updates, difficulty observation, achievement
    /// evaluation, and persistence. Transitions back to Idle.
    pub async fn submit_solution(
        &mut self,
        submission: Submission,
    ) -> Result<SubmissionResult, SessionError> {
        let quest = self
            .profile
            .active_quest
            .clone()
            .ok_or(SessionError::NoActiveQuest)?;

        // Validate and score before touching any state.
        let awarded_xp = scoring::score(&submission.rubric, quest.tier)?;

        let now = now_secs();
        let elapsed = now.saturating_sub(quest.issued_at);
        let overtime = elapsed as f64
            > quest.expected_duration_secs as f64 * self.config.difficulty.overtime_factor;

        let mut next = self.profile.clone();
        next.push_outcome(
            QuestOutcome {
                quest_id: quest.id,
                topic: quest.topic.clone(),
                language: quest.language.clone(),
                tier: quest.tier,
                rubric: Some(submission.rubric),
                hints_used: quest.hints_used,
                kind: OutcomeKind::Solved,
                timestamp: now,
                awarded_xp,
                overtime,
                tags: submission.tags.clone(),
            },
            self.config.history_limit,
        );
        next.award_xp(awarded_xp, &self.config.level_curve);
        next.touch_language(&quest.language, awarded_xp, now);
        next.active_quest = None;

        let mut difficulty = self.difficulty.clone();
        difficulty.observe(&quest.topic, quest.tier, true, overtime);

        let mut unlocked: Vec<String> = achievements::evaluate(&next)
            .into_iter()
            .map(String::from)
            .collect();
        unlocked.sort();
        for id in &unlocked {
            next.achievements.insert(id.clone());
        }

        self.commit(next, difficulty).await?;

        Ok(SubmissionResult {
            awarded_xp,
            new_level: self.profile.level,
            unlocked,
            next_recommended_tier: self.difficulty.recommend(&quest.topic),
        })
    }

    /// Abandon the active quest, transitioning back to Idle.
    ///
    /// Applies the configured penalty (saturating at zero) and records
    /// the abandonment as a non-solve in the topic's difficulty window.
    pub async fn abandon_quest(&mut self) -> Result<(), SessionError> {
        let quest = self
            .profile
            .active_quest
            .clone()
            .ok_or(SessionError::NoActiveQuest)?;

        let mut next = self.profile.clone();
        next.deduct_xp(self.config.abandon_penalty);
        next.push_outcome(
            QuestOutcome {
                quest_id: quest.id,
                topic: quest.topic.clone(),
                language: quest.language.clone(),
                tier: quest.tier,
                rubric: None,
                hints_used: quest.hints_used,
                kind: OutcomeKind::Abandoned,
                timestamp: now_secs(),
                awarded_xp: 0,
                overtime: false,
                tags: Vec::new(),
            },
            self.config.history_limit,
        );
        next.active_quest = None;

        let mut difficulty = self.difficulty.clone();
        difficulty.observe(&quest.topic, quest.tier, false, false);

        self.commit(next, difficulty).await
    }

    /// Persist the candidate state, then swap it in.
    async fn commit(
        &mut self,
        profile: LearnerProfile,
        difficulty: DifficultyController,
    ) -> Result<(), SessionError> {
        let saved = SavedProfile::new(profile, difficulty);
        self.store.save(&saved).await?;
        self.profile = saved.profile;
        self.difficulty = saved.difficulty;
        Ok(())
    }

    /// The learner this session belongs to.
    pub fn learner_id(&self) -> &LearnerId {
        &self.profile.learner_id
    }

    /// The loaded profile.
    pub fn profile(&self) -> &LearnerProfile {
        &self.profile
    }

    /// The difficulty state.
    pub fn difficulty(&self) -> &DifficultyController {
        &self.difficulty
    }

    /// The quest currently in flight, if any.
    pub fn active_quest(&self) -> Option<&Quest> {
        self.profile.active_quest.as_ref()
    }
}
