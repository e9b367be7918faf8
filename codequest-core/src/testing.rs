//! Testing utilities for the progression engine.
//!
//! This module provides tools for integration testing:
//! - `TestHarness` for scripted quest cycles against a real store
//! - Rubric constructors for common grades
//! - Assertion helpers for verifying profile state

use crate::profile::{DifficultyTier, LearnerId, LearnerProfile};
use crate::scoring::Rubric;
use crate::service::ProgressionService;
use crate::session::{ProgressionConfig, SessionError, Submission, SubmissionResult};
use crate::store::ProfileStore;
use std::path::Path;

/// Build a rubric summing to `total` (0-100), spread across dimensions.
///
/// Fills dimensions in declaration order up to each bound, so
/// `rubric_totaling(100)` equals [`Rubric::flawless`].
pub fn rubric_totaling(total: u32) -> Rubric {
    let mut remaining = total.min(100);
    let mut take = |max: u32| {
        let v = remaining.min(max);
        remaining -= v;
        v
    };
    Rubric::new(take(25), take(30), take(20), take(15), take(10))
}

/// Test harness driving one learner through scripted quest cycles.
pub struct TestHarness {
    /// The service under test.
    pub service: ProgressionService,
    /// The learner every helper operates on.
    pub learner_id: LearnerId,
}

impl TestHarness {
    /// Create a harness with a store rooted at `dir` and default config.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_config(dir, ProgressionConfig::default())
    }

    /// Create a harness with custom progression tuning.
    pub fn with_config(dir: impl AsRef<Path>, config: ProgressionConfig) -> Self {
        Self {
            service: ProgressionService::new(ProfileStore::new(dir.as_ref()), config),
            learner_id: LearnerId::new("Test Learner"),
        }
    }

    /// Start a quest in `topic` (language "rust", recommended tier).
    pub async fn start(&self, topic: &str) -> Result<(), SessionError> {
        self.service
            .start_quest(&self.learner_id, topic, "rust", None)
            .await?;
        Ok(())
    }

    /// Start a quest at an explicit tier.
    pub async fn start_at(
        &self,
        topic: &str,
        tier: DifficultyTier,
    ) -> Result<(), SessionError> {
        self.service
            .start_quest(&self.learner_id, topic, "rust", Some(tier))
            .await?;
        Ok(())
    }

    /// Submit a solution whose rubric sums to `total`.
    pub async fn solve_with(&self, total: u32) -> Result<SubmissionResult, SessionError> {
        self.service
            .submit_solution(&self.learner_id, Submission::new(rubric_totaling(total)))
            .await
    }

    /// Start and immediately solve a quest in `topic`.
    pub async fn cycle(&self, topic: &str, total: u32) -> Result<SubmissionResult, SessionError> {
        self.start(topic).await?;
        self.solve_with(total).await
    }

    /// Abandon the active quest.
    pub async fn abandon(&self) -> Result<(), SessionError> {
        self.service.abandon_quest(&self.learner_id).await
    }

    /// The learner's current profile. Panics if none exists yet.
    pub async fn profile(&self) -> LearnerProfile {
        self.service
            .get_profile(&self.learner_id)
            .await
            .expect("store readable")
            .expect("profile exists")
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the profile's total XP.
#[track_caller]
pub fn assert_total_xp(profile: &LearnerProfile, expected: u64) {
    assert_eq!(
        profile.total_xp, expected,
        "Expected total XP {expected}, got {}",
        profile.total_xp
    );
}

/// Assert the profile's overall level.
#[track_caller]
pub fn assert_level(profile: &LearnerProfile, expected: u32) {
    assert_eq!(
        profile.level, expected,
        "Expected level {expected}, got {}",
        profile.level
    );
}

/// Assert the profile holds an achievement.
#[track_caller]
pub fn assert_has_achievement(profile: &LearnerProfile, id: &str) {
    assert!(
        profile.achievements.contains(id),
        "Expected achievement '{id}' to be unlocked"
    );
}

/// Assert the profile does NOT hold an achievement.
#[track_caller]
pub fn assert_no_achievement(profile: &LearnerProfile, id: &str) {
    assert!(
        !profile.achievements.contains(id),
        "Expected achievement '{id}' to NOT be unlocked"
    );
}

/// Assert no quest is in flight.
#[track_caller]
pub fn assert_idle(profile: &LearnerProfile) {
    assert!(
        profile.active_quest.is_none(),
        "Expected no active quest, found {:?}",
        profile.active_quest
    );
}

/// Assert a quest is in flight.
#[track_caller]
pub fn assert_quest_active(profile: &LearnerProfile) {
    assert!(profile.active_quest.is_some(), "Expected an active quest");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rubric_totaling_spreads_in_order() {
        let r = rubric_totaling(50);
        assert_eq!((r.code_quality, r.problem_solving), (25, 25));
        assert_eq!(r.total(), 50);

        assert_eq!(rubric_totaling(100), Rubric::flawless());
        assert_eq!(rubric_totaling(0).total(), 0);
    }

    #[tokio::test]
    async fn test_harness_cycle() {
        let tmp = TempDir::new().expect("temp dir");
        let harness = TestHarness::new(tmp.path());

        let result = harness.cycle("recursion", 50).await.expect("cycle");
        assert_eq!(result.awarded_xp, 50);

        let profile = harness.profile().await;
        assert_total_xp(&profile, 50);
        assert_idle(&profile);
        assert_has_achievement(&profile, "first_quest");
        assert_no_achievement(&profile, "ten_quests");
    }
}
