//! Adaptive difficulty controller.
//!
//! Maintains a per-topic rolling window of recent outcomes and recommends
//! the tier for the next quest. Recommendations move at most one tier per
//! call, so a hot streak or a slump never produces an oscillation shock.

use crate::profile::DifficultyTier;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Tuning knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Maximum outcomes retained per topic window.
    pub window_capacity: usize,

    /// Success rate above which the tier escalates.
    pub escalate_above: f64,

    /// Success rate below which the tier de-escalates.
    pub deescalate_below: f64,

    /// A solve slower than `expected * overtime_factor` counts as a
    /// near-failure for escalation purposes.
    pub overtime_factor: f64,
}

impl DifficultyConfig {
    /// Set the window capacity.
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    /// Set the escalation threshold.
    pub fn with_escalate_above(mut self, rate: f64) -> Self {
        self.escalate_above = rate;
        self
    }

    /// Set the de-escalation threshold.
    pub fn with_deescalate_below(mut self, rate: f64) -> Self {
        self.deescalate_below = rate;
        self
    }

    /// Set the overtime factor.
    pub fn with_overtime_factor(mut self, factor: f64) -> Self {
        self.overtime_factor = factor;
        self
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            window_capacity: 10,
            escalate_above: 0.85,
            deescalate_below: 0.60,
            overtime_factor: 2.0,
        }
    }
}

/// One observed outcome in a topic window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    /// Whether the quest was solved at all.
    pub solved: bool,

    /// Whether the solve blew the overtime threshold.
    pub overtime: bool,
}

impl WindowEntry {
    /// A solve only counts toward escalation if it came in on time.
    pub fn is_success(&self) -> bool {
        self.solved && !self.overtime
    }
}

/// Rolling state for a single topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TopicWindow {
    entries: VecDeque<WindowEntry>,
    current_tier: DifficultyTier,
}

/// Per-learner difficulty state across topics.
///
/// Serialized alongside the profile so recommendations survive restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyController {
    topics: HashMap<String, TopicWindow>,
    config: DifficultyConfig,
}

impl DifficultyController {
    pub fn new(config: DifficultyConfig) -> Self {
        Self {
            topics: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Record a resolved quest in the topic's window.
    ///
    /// FIFO-evicts the oldest entry once the window exceeds capacity, so
    /// the window length never exceeds `window_capacity`.
    pub fn observe(&mut self, topic: &str, tier: DifficultyTier, solved: bool, overtime: bool) {
        let window = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicWindow {
                entries: VecDeque::new(),
                current_tier: tier,
            });

        window.current_tier = tier;
        window.entries.push_back(WindowEntry { solved, overtime });
        while window.entries.len() > self.config.window_capacity {
            window.entries.pop_front();
        }
    }

    /// Success rate over the current window, if any outcomes are recorded.
    pub fn success_rate(&self, topic: &str) -> Option<f64> {
        let window = self.topics.get(topic)?;
        if window.entries.is_empty() {
            return None;
        }
        let successes = window.entries.iter().filter(|e| e.is_success()).count();
        Some(successes as f64 / window.entries.len() as f64)
    }

    /// Recommend the tier for the next quest in `topic`.
    ///
    /// An empty window holds the last-used tier, or starts at `Newbie` for
    /// an unseen topic. Otherwise the success rate drives a single
    /// saturating step: escalate above the high threshold, de-escalate
    /// below the low one, hold in between.
    pub fn recommend(&self, topic: &str) -> DifficultyTier {
        let Some(window) = self.topics.get(topic) else {
            return DifficultyTier::Newbie;
        };

        let current = window.current_tier;
        let Some(rate) = self.success_rate(topic) else {
            return current;
        };

        if rate > self.config.escalate_above {
            current.step_up()
        } else if rate < self.config.deescalate_below {
            current.step_down()
        } else {
            current
        }
    }

    /// Tier most recently observed for `topic`, if any.
    pub fn last_tier(&self, topic: &str) -> Option<DifficultyTier> {
        self.topics.get(topic).map(|w| w.current_tier)
    }
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(DifficultyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DifficultyController {
        DifficultyController::new(DifficultyConfig::default())
    }

    #[test]
    fn test_unseen_topic_recommends_newbie() {
        assert_eq!(controller().recommend("recursion"), DifficultyTier::Newbie);
    }

    #[test]
    fn test_full_window_of_solves_escalates_one_tier() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.observe("recursion", DifficultyTier::Apprentice, true, false);
        }

        assert_eq!(ctl.success_rate("recursion"), Some(1.0));
        assert_eq!(ctl.recommend("recursion"), DifficultyTier::Journeyman);
    }

    #[test]
    fn test_low_success_rate_deescalates_one_tier() {
        let mut ctl = controller();
        for i in 0..10 {
            ctl.observe("lifetimes", DifficultyTier::Expert, i % 2 == 0, false);
        }

        assert_eq!(ctl.success_rate("lifetimes"), Some(0.5));
        assert_eq!(ctl.recommend("lifetimes"), DifficultyTier::Journeyman);
    }

    #[test]
    fn test_middling_rate_holds_tier() {
        let mut ctl = controller();
        for i in 0..10 {
            // 7 of 10 solved: inside the hold band.
            ctl.observe("traits", DifficultyTier::Journeyman, i < 7, false);
        }

        assert_eq!(ctl.recommend("traits"), DifficultyTier::Journeyman);
    }

    #[test]
    fn test_recommendation_never_skips_tiers() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.observe("iterators", DifficultyTier::Newbie, true, false);
        }

        // A perfect window still climbs exactly one step.
        let next = ctl.recommend("iterators");
        assert_eq!(next, DifficultyTier::Apprentice);

        for tier in DifficultyTier::ALL {
            let mut ctl = controller();
            for _ in 0..10 {
                ctl.observe("t", tier, true, false);
            }
            let up = ctl.recommend("t");
            assert!(up == tier || up == tier.step_up());
        }
    }

    #[test]
    fn test_escalation_saturates_at_master() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.observe("macros", DifficultyTier::Master, true, false);
        }
        assert_eq!(ctl.recommend("macros"), DifficultyTier::Master);
    }

    #[test]
    fn test_deescalation_saturates_at_newbie() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.observe("macros", DifficultyTier::Newbie, false, false);
        }
        assert_eq!(ctl.recommend("macros"), DifficultyTier::Newbie);
    }

    #[test]
    fn test_window_evicts_fifo_at_capacity() {
        let mut ctl = DifficultyController::new(
            DifficultyConfig::default().with_window_capacity(3),
        );

        // Three failures, then three solves: failures age out entirely.
        for _ in 0..3 {
            ctl.observe("borrowck", DifficultyTier::Apprentice, false, false);
        }
        for _ in 0..3 {
            ctl.observe("borrowck", DifficultyTier::Apprentice, true, false);
        }

        assert_eq!(ctl.success_rate("borrowck"), Some(1.0));
        assert_eq!(ctl.recommend("borrowck"), DifficultyTier::Journeyman);
    }

    #[test]
    fn test_overtime_solve_counts_as_near_failure() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.observe("async", DifficultyTier::Journeyman, true, true);
        }

        // Solved, but never on time: rate 0.0, so the tier drops.
        assert_eq!(ctl.success_rate("async"), Some(0.0));
        assert_eq!(ctl.recommend("async"), DifficultyTier::Apprentice);
    }

    #[test]
    fn test_last_tier_tracks_observations() {
        let mut ctl = controller();
        ctl.observe("generics", DifficultyTier::Expert, true, false);
        assert_eq!(ctl.last_tier("generics"), Some(DifficultyTier::Expert));
        assert_eq!(ctl.last_tier("unseen"), None);
    }

    #[test]
    fn test_topics_are_independent() {
        let mut ctl = controller();
        for _ in 0..10 {
            ctl.observe("recursion", DifficultyTier::Expert, true, false);
            ctl.observe("lifetimes", DifficultyTier::Apprentice, false, false);
        }

        assert_eq!(ctl.recommend("recursion"), DifficultyTier::Master);
        assert_eq!(ctl.recommend("lifetimes"), DifficultyTier::Newbie);
    }
}
