//! Learner progression data model.
//!
//! Contains all types for representing a learner's persistent state:
//! profiles, issued quests, resolved outcomes, difficulty tiers, and the
//! XP-to-level curve.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for learners.
///
/// Supplied by the command-dispatch layer; doubles as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearnerId(pub String);

impl LearnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for issued quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestId(pub Uuid);

impl QuestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Difficulty Tiers
// ============================================================================

/// The five challenge difficulty tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DifficultyTier {
    Newbie,
    Apprentice,
    Journeyman,
    Expert,
    Master,
}

impl DifficultyTier {
    /// All tiers in ascending order.
    pub const ALL: [DifficultyTier; 5] = [
        DifficultyTier::Newbie,
        DifficultyTier::Apprentice,
        DifficultyTier::Journeyman,
        DifficultyTier::Expert,
        DifficultyTier::Master,
    ];

    /// XP multiplier applied to a rubric's base score at this tier.
    pub fn multiplier(&self) -> f64 {
        match self {
            DifficultyTier::Newbie => 1.0,
            DifficultyTier::Apprentice => 1.5,
            DifficultyTier::Journeyman => 2.0,
            DifficultyTier::Expert => 2.5,
            DifficultyTier::Master => 3.0,
        }
    }

    /// Advisory time budget for a quest issued at this tier.
    pub fn expected_duration_secs(&self) -> u64 {
        match self {
            DifficultyTier::Newbie => 600,
            DifficultyTier::Apprentice => 900,
            DifficultyTier::Journeyman => 1500,
            DifficultyTier::Expert => 2400,
            DifficultyTier::Master => 3600,
        }
    }

    /// The next tier up, saturating at `Master`.
    pub fn step_up(&self) -> DifficultyTier {
        match self {
            DifficultyTier::Newbie => DifficultyTier::Apprentice,
            DifficultyTier::Apprentice => DifficultyTier::Journeyman,
            DifficultyTier::Journeyman => DifficultyTier::Expert,
            DifficultyTier::Expert | DifficultyTier::Master => DifficultyTier::Master,
        }
    }

    /// The next tier down, saturating at `Newbie`.
    pub fn step_down(&self) -> DifficultyTier {
        match self {
            DifficultyTier::Newbie | DifficultyTier::Apprentice => DifficultyTier::Newbie,
            DifficultyTier::Journeyman => DifficultyTier::Apprentice,
            DifficultyTier::Expert => DifficultyTier::Journeyman,
            DifficultyTier::Master => DifficultyTier::Expert,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DifficultyTier::Newbie => "Newbie",
            DifficultyTier::Apprentice => "Apprentice",
            DifficultyTier::Journeyman => "Journeyman",
            DifficultyTier::Expert => "Expert",
            DifficultyTier::Master => "Master",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Per-Language Progress
// ============================================================================

/// XP below which a language is considered beginner-level.
pub const INTERMEDIATE_XP: u64 = 500;

/// XP below which a language is considered intermediate-level.
pub const ADVANCED_XP: u64 = 2000;

/// Coarse skill band for one programming language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Band for an accumulated per-language XP total.
    pub fn for_xp(xp: u64) -> SkillLevel {
        if xp >= ADVANCED_XP {
            SkillLevel::Advanced
        } else if xp >= INTERMEDIATE_XP {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }
}

/// Progress within a single programming language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProgress {
    /// Current skill band, derived from `xp`.
    pub skill_level: SkillLevel,

    /// XP earned in this language.
    pub xp: u64,

    /// Epoch seconds of the last resolved quest in this language.
    pub last_activity: u64,
}

// ============================================================================
// Quests and Outcomes
// ============================================================================

/// An issued challenge instance awaiting resolution.
///
/// Owned by the session that issued it until submitted or abandoned,
/// after which it becomes an immutable [`QuestOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    /// Unique quest id.
    pub id: QuestId,

    /// Topic tag, e.g. "recursion" or "error-handling".
    pub topic: String,

    /// Language tag, e.g. "rust" or "python".
    pub language: String,

    /// Difficulty tier the quest was issued at.
    pub tier: DifficultyTier,

    /// Epoch seconds when the quest was issued.
    pub issued_at: u64,

    /// Advisory time budget for the solve.
    pub expected_duration_secs: u64,

    /// Hints taken against this quest so far.
    pub hints_used: u32,
}

impl Quest {
    /// Issue a new quest at the given tier.
    pub fn issue(topic: impl Into<String>, language: impl Into<String>, tier: DifficultyTier) -> Self {
        Self {
            id: QuestId::new(),
            topic: topic.into(),
            language: language.into(),
            tier,
            issued_at: now_secs(),
            expected_duration_secs: tier.expected_duration_secs(),
            hints_used: 0,
        }
    }
}

/// How a quest was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Solved,
    Abandoned,
}

/// Immutable record of a resolved quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestOutcome {
    /// Id of the originating quest.
    pub quest_id: QuestId,

    /// Topic tag carried over from the quest.
    pub topic: String,

    /// Language tag carried over from the quest.
    pub language: String,

    /// Tier the quest was attempted at.
    pub tier: DifficultyTier,

    /// Graded rubric for solves; `None` for abandonments.
    pub rubric: Option<crate::scoring::Rubric>,

    /// Hints taken during the attempt.
    pub hints_used: u32,

    /// Whether the quest was solved or abandoned.
    pub kind: OutcomeKind,

    /// Epoch seconds when the quest was resolved.
    pub timestamp: u64,

    /// XP awarded for the attempt (0 for abandonments).
    pub awarded_xp: u64,

    /// Whether the solve exceeded the overtime threshold.
    pub overtime: bool,

    /// Design-pattern tags flagged by upstream analysis.
    #[serde(default)]
    pub tags: Vec<String>,
}

// ============================================================================
// Level Curve
// ============================================================================

/// XP-to-level curve.
///
/// Level `n` is reached at a cumulative cost of `base_xp * n * (n + 1) / 2`,
/// so each level costs `base_xp * n` more than the last. The curve is a
/// tunable parameter; nothing else in the engine assumes a specific shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelCurve {
    /// XP cost of the first level.
    pub base_xp: u64,
}

impl LevelCurve {
    pub fn new(base_xp: u64) -> Self {
        Self { base_xp }
    }

    /// Cumulative XP required to reach `level`.
    pub fn xp_for_level(&self, level: u32) -> u64 {
        let n = level as u64;
        self.base_xp * n * (n + 1) / 2
    }

    /// Highest level whose cumulative cost fits within `total_xp`.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        if self.base_xp == 0 {
            return 0;
        }
        let mut level = 0;
        while self.xp_for_level(level + 1) <= total_xp {
            level += 1;
        }
        level
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self { base_xp: 100 }
    }
}

// ============================================================================
// Learner Profile
// ============================================================================

/// Persistent per-learner progression state.
///
/// Created on first interaction and mutated only at the end of a resolved
/// quest or on achievement unlock. One profile per [`LearnerId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Storage key for this learner.
    pub learner_id: LearnerId,

    /// Overall level. Monotonically non-decreasing: reads take the max of
    /// this stored value and the value derived from `total_xp`, so a
    /// re-tuned curve can never regress a level already reached.
    pub level: u32,

    /// Sum of all XP deltas ever applied.
    pub total_xp: u64,

    /// Per-language progress keyed by language tag.
    pub per_language: HashMap<String, LanguageProgress>,

    /// Unlocked achievement ids.
    pub achievements: HashSet<String>,

    /// The one quest currently in flight, if any.
    pub active_quest: Option<Quest>,

    /// Resolved quests, oldest first, truncated to a bounded recent window.
    pub history: Vec<QuestOutcome>,
}

impl LearnerProfile {
    /// Fresh profile: level 0, zero XP, empty history.
    pub fn new(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            level: 0,
            total_xp: 0,
            per_language: HashMap::new(),
            achievements: HashSet::new(),
            active_quest: None,
            history: Vec::new(),
        }
    }

    /// Current level under `curve`, never below the stored level.
    pub fn level_with(&self, curve: &LevelCurve) -> u32 {
        self.level.max(curve.level_for(self.total_xp))
    }

    /// Award XP and re-derive the level.
    pub fn award_xp(&mut self, amount: u64, curve: &LevelCurve) {
        self.total_xp += amount;
        self.level = self.level_with(curve);
    }

    /// Deduct XP, saturating at zero. The level is untouched.
    pub fn deduct_xp(&mut self, amount: u64) {
        self.total_xp = self.total_xp.saturating_sub(amount);
    }

    /// Credit XP to a language and refresh its skill band.
    pub fn touch_language(&mut self, language: &str, xp: u64, now: u64) {
        let entry = self
            .per_language
            .entry(language.to_string())
            .or_insert(LanguageProgress {
                skill_level: SkillLevel::Beginner,
                xp: 0,
                last_activity: now,
            });
        entry.xp += xp;
        entry.last_activity = now;
        entry.skill_level = SkillLevel::for_xp(entry.xp);
    }

    /// Append an outcome, truncating the retained window to `limit`.
    pub fn push_outcome(&mut self, outcome: QuestOutcome, limit: usize) {
        self.history.push(outcome);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }
}

/// Current timestamp in epoch seconds.
///
/// Simple timestamp without a chrono dependency.
pub(crate) fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
