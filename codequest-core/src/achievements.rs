//! Achievement catalogue and unlock evaluation.
//!
//! The catalogue is a process-wide static table, closed at deploy time:
//! each definition pairs display metadata with a pure predicate over a
//! learner's history and aggregate counters. Evaluation only ever reports
//! achievements the profile does not already hold, so it is idempotent.

use crate::profile::{LearnerProfile, OutcomeKind};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Display rarity for an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl AchievementTier {
    pub fn display_name(&self) -> &'static str {
        match self {
            AchievementTier::Bronze => "Bronze",
            AchievementTier::Silver => "Silver",
            AchievementTier::Gold => "Gold",
            AchievementTier::Platinum => "Platinum",
        }
    }
}

/// Aggregate counters derived from a profile's retained history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileStats {
    /// Quests solved.
    pub total_solved: u64,

    /// Quests abandoned.
    pub total_abandoned: u64,

    /// Hints taken across all resolved quests.
    pub hints_used: u64,

    /// Distinct languages with recorded progress.
    pub languages_touched: usize,

    /// Distinct topics appearing in the history.
    pub topics_touched: usize,

    /// Distinct design-pattern tags flagged by upstream analysis.
    pub distinct_tags: usize,

    /// Solves with a full-marks rubric.
    pub flawless_solves: u64,

    /// Solves at the Master tier.
    pub master_solves: u64,

    /// Longest run of consecutive hint-free solves.
    pub best_hintless_streak: u64,

    /// Whether a solve directly followed three or more abandonments.
    pub comeback: bool,
}

impl ProfileStats {
    /// Compute counters over the profile's retained history window.
    pub fn collect(profile: &LearnerProfile) -> Self {
        let mut stats = ProfileStats {
            languages_touched: profile.per_language.len(),
            ..ProfileStats::default()
        };

        let mut topics = HashSet::new();
        let mut tags = HashSet::new();
        let mut hintless_run = 0u64;
        let mut abandoned_run = 0u64;

        for outcome in &profile.history {
            topics.insert(outcome.topic.as_str());
            for tag in &outcome.tags {
                tags.insert(tag.as_str());
            }
            stats.hints_used += u64::from(outcome.hints_used);

            match outcome.kind {
                OutcomeKind::Solved => {
                    stats.total_solved += 1;
                    if abandoned_run >= 3 {
                        stats.comeback = true;
                    }
                    abandoned_run = 0;

                    if outcome.hints_used == 0 {
                        hintless_run += 1;
                        stats.best_hintless_streak =
                            stats.best_hintless_streak.max(hintless_run);
                    } else {
                        hintless_run = 0;
                    }

                    if outcome.rubric.is_some_and(|r| r.is_flawless()) {
                        stats.flawless_solves += 1;
                    }
                    if outcome.tier == crate::profile::DifficultyTier::Master {
                        stats.master_solves += 1;
                    }
                }
                OutcomeKind::Abandoned => {
                    stats.total_abandoned += 1;
                    abandoned_run += 1;
                    hintless_run = 0;
                }
            }
        }

        stats.topics_touched = topics.len();
        stats.distinct_tags = tags.len();
        stats
    }
}

/// Everything a predicate may inspect.
pub struct AchievementContext<'a> {
    /// The full profile, history included.
    pub profile: &'a LearnerProfile,

    /// Counters precomputed from the retained history window.
    pub stats: ProfileStats,
}

/// A catalogue entry: display metadata plus an unlock predicate.
#[derive(Clone)]
pub struct AchievementDef {
    /// Stable unique identifier.
    pub id: &'static str,

    /// Display name.
    pub name: &'static str,

    /// Description of how to unlock.
    pub description: &'static str,

    /// Display rarity.
    pub tier: AchievementTier,

    /// Hidden achievements are not surfaced until unlocked.
    pub hidden: bool,

    /// Pure predicate deciding whether the profile qualifies.
    pub predicate: fn(&AchievementContext) -> bool,
}

impl AchievementDef {
    pub const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        tier: AchievementTier,
        predicate: fn(&AchievementContext) -> bool,
    ) -> Self {
        Self {
            id,
            name,
            description,
            tier,
            hidden: false,
            predicate,
        }
    }

    /// Mark as a hidden achievement.
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

lazy_static! {
    /// The full achievement catalogue.
    pub static ref CATALOGUE: Vec<AchievementDef> = vec![
        AchievementDef::new(
            "first_quest",
            "First Steps",
            "Solve your first quest",
            AchievementTier::Bronze,
            |ctx| ctx.stats.total_solved >= 1,
        ),
        AchievementDef::new(
            "ten_quests",
            "Seasoned Solver",
            "Solve 10 quests",
            AchievementTier::Silver,
            |ctx| ctx.stats.total_solved >= 10,
        ),
        AchievementDef::new(
            "fifty_quests",
            "Quest Veteran",
            "Solve 50 quests",
            AchievementTier::Gold,
            |ctx| ctx.stats.total_solved >= 50,
        ),
        AchievementDef::new(
            "flawless",
            "Flawless Victory",
            "Solve a quest with a perfect rubric",
            AchievementTier::Silver,
            |ctx| ctx.stats.flawless_solves >= 1,
        ),
        AchievementDef::new(
            "self_reliant",
            "Self Reliant",
            "Solve 5 quests in a row without hints",
            AchievementTier::Silver,
            |ctx| ctx.stats.best_hintless_streak >= 5,
        ),
        AchievementDef::new(
            "polyglot",
            "Polyglot",
            "Earn XP in 3 different languages",
            AchievementTier::Silver,
            |ctx| ctx.stats.languages_touched >= 3,
        ),
        AchievementDef::new(
            "explorer",
            "Topic Explorer",
            "Attempt quests across 5 different topics",
            AchievementTier::Bronze,
            |ctx| ctx.stats.topics_touched >= 5,
        ),
        AchievementDef::new(
            "master_solve",
            "Into the Deep",
            "Solve a quest at the Master tier",
            AchievementTier::Gold,
            |ctx| ctx.stats.master_solves >= 1,
        ),
        AchievementDef::new(
            "level_5",
            "Rising Star",
            "Reach level 5",
            AchievementTier::Silver,
            |ctx| ctx.profile.level >= 5,
        ),
        AchievementDef::new(
            "level_10",
            "Code Sage",
            "Reach level 10",
            AchievementTier::Gold,
            |ctx| ctx.profile.level >= 10,
        ),
        AchievementDef::new(
            "pattern_collector",
            "Pattern Collector",
            "Get 5 distinct design patterns flagged in your solutions",
            AchievementTier::Gold,
            |ctx| ctx.stats.distinct_tags >= 5,
        ),
        AchievementDef::new(
            "comeback",
            "Comeback",
            "Solve a quest after three straight abandonments",
            AchievementTier::Bronze,
            |ctx| ctx.stats.comeback,
        )
        .hidden(),
    ];
}

/// Look up a catalogue entry by id.
pub fn get_achievement(id: &str) -> Option<&'static AchievementDef> {
    CATALOGUE.iter().find(|a| a.id == id)
}

/// Evaluate the catalogue against a profile.
///
/// Returns only newly-qualifying achievement ids; anything already in
/// `profile.achievements` is excluded, so re-evaluating an unchanged
/// profile yields the empty set.
pub fn evaluate(profile: &LearnerProfile) -> HashSet<&'static str> {
    evaluate_with(&CATALOGUE, profile)
}

/// Evaluate an explicit definition slice against a profile.
///
/// A panicking predicate is logged and treated as not qualifying; the
/// remaining definitions still evaluate.
pub fn evaluate_with<'a>(
    defs: &'a [AchievementDef],
    profile: &LearnerProfile,
) -> HashSet<&'a str> {
    let ctx = AchievementContext {
        profile,
        stats: ProfileStats::collect(profile),
    };

    let mut unlocked = HashSet::new();
    for def in defs {
        if profile.achievements.contains(def.id) {
            continue;
        }

        match catch_unwind(AssertUnwindSafe(|| (def.predicate)(&ctx))) {
            Ok(true) => {
                unlocked.insert(def.id);
            }
            Ok(false) => {}
            Err(_) => {
                tracing::warn!(achievement = def.id, "achievement predicate panicked");
            }
        }
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        DifficultyTier, LearnerId, OutcomeKind, Quest, QuestOutcome,
    };
    use crate::scoring::Rubric;

    fn outcome(kind: OutcomeKind, tier: DifficultyTier, hints: u32) -> QuestOutcome {
        let quest = Quest::issue("topic", "rust", tier);
        QuestOutcome {
            quest_id: quest.id,
            topic: quest.topic,
            language: quest.language,
            tier,
            rubric: match kind {
                OutcomeKind::Solved => Some(Rubric::new(10, 10, 10, 10, 5)),
                OutcomeKind::Abandoned => None,
            },
            hints_used: hints,
            kind,
            timestamp: 0,
            awarded_xp: 0,
            overtime: false,
            tags: Vec::new(),
        }
    }

    fn profile_with_solves(count: usize) -> LearnerProfile {
        let mut profile = LearnerProfile::new(LearnerId::new("ada"));
        for _ in 0..count {
            profile.push_outcome(
                outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 0),
                1000,
            );
        }
        profile
    }

    #[test]
    fn test_first_solve_unlocks_first_quest() {
        let profile = profile_with_solves(1);
        let unlocked = evaluate(&profile);
        assert!(unlocked.contains("first_quest"));
        assert!(!unlocked.contains("ten_quests"));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut profile = profile_with_solves(1);
        let first = evaluate(&profile);
        assert!(!first.is_empty());

        for id in &first {
            profile.achievements.insert((*id).to_string());
        }

        assert!(evaluate(&profile).is_empty());
    }

    #[test]
    fn test_ladder_thresholds() {
        let unlocked = evaluate(&profile_with_solves(10));
        assert!(unlocked.contains("ten_quests"));
        assert!(!unlocked.contains("fifty_quests"));

        let unlocked = evaluate(&profile_with_solves(50));
        assert!(unlocked.contains("fifty_quests"));
    }

    #[test]
    fn test_flawless_requires_full_rubric() {
        let mut profile = LearnerProfile::new(LearnerId::new("ada"));
        let mut solved = outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 0);
        solved.rubric = Some(Rubric::flawless());
        profile.push_outcome(solved, 1000);

        assert!(evaluate(&profile).contains("flawless"));
    }

    #[test]
    fn test_hintless_streak_resets_on_hint_or_abandon() {
        let mut profile = LearnerProfile::new(LearnerId::new("ada"));
        for _ in 0..4 {
            profile.push_outcome(
                outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 0),
                1000,
            );
        }
        profile.push_outcome(
            outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 2),
            1000,
        );

        let stats = ProfileStats::collect(&profile);
        assert_eq!(stats.best_hintless_streak, 4);
        assert!(!evaluate(&profile).contains("self_reliant"));

        for _ in 0..5 {
            profile.push_outcome(
                outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 0),
                1000,
            );
        }
        assert!(evaluate(&profile).contains("self_reliant"));
    }

    #[test]
    fn test_comeback_is_hidden_and_detected() {
        let def = get_achievement("comeback").unwrap();
        assert!(def.hidden);

        let mut profile = LearnerProfile::new(LearnerId::new("ada"));
        for _ in 0..3 {
            profile.push_outcome(
                outcome(OutcomeKind::Abandoned, DifficultyTier::Newbie, 0),
                1000,
            );
        }
        profile.push_outcome(
            outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 0),
            1000,
        );

        assert!(evaluate(&profile).contains("comeback"));
    }

    #[test]
    fn test_pattern_tags_counted_distinct() {
        let mut profile = LearnerProfile::new(LearnerId::new("ada"));
        for tags in [
            vec!["builder", "visitor"],
            vec!["builder", "observer"],
            vec!["strategy", "adapter"],
        ] {
            let mut o = outcome(OutcomeKind::Solved, DifficultyTier::Newbie, 0);
            o.tags = tags.into_iter().map(String::from).collect();
            profile.push_outcome(o, 1000);
        }

        let stats = ProfileStats::collect(&profile);
        assert_eq!(stats.distinct_tags, 5);
        assert!(evaluate(&profile).contains("pattern_collector"));
    }

    #[test]
    fn test_panicking_predicate_is_isolated() {
        let defs = vec![
            AchievementDef::new(
                "panics",
                "Panics",
                "Always panics",
                AchievementTier::Bronze,
                |_| panic!("predicate bug"),
            ),
            AchievementDef::new(
                "fine",
                "Fine",
                "Always qualifies",
                AchievementTier::Bronze,
                |_| true,
            ),
        ];

        let profile = LearnerProfile::new(LearnerId::new("ada"));
        let unlocked = evaluate_with(&defs, &profile);

        assert!(!unlocked.contains("panics"));
        assert!(unlocked.contains("fine"));
    }

    #[test]
    fn test_catalogue_ids_are_unique() {
        let mut seen = HashSet::new();
        for def in CATALOGUE.iter() {
            assert!(seen.insert(def.id), "duplicate achievement id {}", def.id);
        }
    }

    #[test]
    fn test_get_achievement() {
        assert_eq!(get_achievement("first_quest").unwrap().name, "First Steps");
        assert!(get_achievement("nonexistent").is_none());
    }
}
