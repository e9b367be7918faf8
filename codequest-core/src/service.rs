//! ProgressionService - the surface the command dispatcher calls.
//!
//! Wraps the store and session machinery behind per-learner operations.
//! Each learner key has a dedicated guard, so mutating operations on the
//! same profile are serialized (single-writer discipline) while different
//! learners proceed fully in parallel.

use crate::profile::{DifficultyTier, LearnerId, LearnerProfile, Quest, QuestOutcome};
use crate::session::{
    HintPayload, ProgressionConfig, ProgressionSession, SessionError, Submission, SubmissionResult,
};
use crate::store::{ProfileMetadata, ProfileStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Multi-learner progression engine front end.
pub struct ProgressionService {
    store: Arc<ProfileStore>,
    config: ProgressionConfig,
    guards: Mutex<HashMap<LearnerId, Arc<Mutex<()>>>>,
}

impl ProgressionService {
    pub fn new(store: ProfileStore, config: ProgressionConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// The guard serializing operations on one learner key.
    async fn guard(&self, learner_id: &LearnerId) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        guards
            .entry(learner_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn open(&self, learner_id: &LearnerId) -> Result<ProgressionSession, SessionError> {
        ProgressionSession::open(self.store.clone(), self.config.clone(), learner_id.clone())
            .await
    }

    /// Issue a quest for a learner. See [`ProgressionSession::start_quest`].
    pub async fn start_quest(
        &self,
        learner_id: &LearnerId,
        topic: &str,
        language: &str,
        requested_tier: Option<DifficultyTier>,
    ) -> Result<Quest, SessionError> {
        let guard = self.guard(learner_id).await;
        let _held = guard.lock().await;

        let mut session = self.open(learner_id).await?;
        session.start_quest(topic, language, requested_tier).await
    }

    /// Take a hint against a learner's active quest.
    pub async fn request_hint(&self, learner_id: &LearnerId) -> Result<HintPayload, SessionError> {
        let guard = self.guard(learner_id).await;
        let _held = guard.lock().await;

        let mut session = self.open(learner_id).await?;
        session.request_hint().await
    }

    /// Score a learner's submitted solution.
    pub async fn submit_solution(
        &self,
        learner_id: &LearnerId,
        submission: Submission,
    ) -> Result<SubmissionResult, SessionError> {
        let guard = self.guard(learner_id).await;
        let _held = guard.lock().await;

        let mut session = self.open(learner_id).await?;
        session.submit_solution(submission).await
    }

    /// Abandon a learner's active quest.
    pub async fn abandon_quest(&self, learner_id: &LearnerId) -> Result<(), SessionError> {
        let guard = self.guard(learner_id).await;
        let _held = guard.lock().await;

        let mut session = self.open(learner_id).await?;
        session.abandon_quest().await
    }

    /// Fetch a learner's profile, or `None` if they have never interacted.
    pub async fn get_profile(
        &self,
        learner_id: &LearnerId,
    ) -> Result<Option<LearnerProfile>, StoreError> {
        Ok(self.store.load(learner_id).await?.map(|s| s.profile))
    }

    /// Unlocked achievement ids for a learner, sorted.
    pub async fn get_achievements(
        &self,
        learner_id: &LearnerId,
    ) -> Result<Vec<String>, StoreError> {
        let mut ids = match self.store.load(learner_id).await? {
            Some(saved) => saved.profile.achievements.into_iter().collect::<Vec<_>>(),
            None => Vec::new(),
        };
        ids.sort();
        Ok(ids)
    }

    /// A learner's resolved quests, optionally filtered by topic.
    pub async fn get_history(
        &self,
        learner_id: &LearnerId,
        topic: Option<&str>,
    ) -> Result<Vec<QuestOutcome>, StoreError> {
        let history = match self.store.load(learner_id).await? {
            Some(saved) => saved.profile.history,
            None => Vec::new(),
        };

        Ok(match topic {
            Some(topic) => history.into_iter().filter(|o| o.topic == topic).collect(),
            None => history,
        })
    }

    /// Enumerate all known learners, for reporting layers.
    pub async fn list_learners(&self) -> Result<Vec<ProfileMetadata>, StoreError> {
        self.store.list_learners().await
    }
}
