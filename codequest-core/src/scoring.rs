//! Scoring engine: turns a graded rubric into an XP award.
//!
//! Scoring is a pure function of the rubric and the difficulty tier.
//! The rubric arrives pre-graded from an external quality-analysis
//! collaborator; this module only validates bounds and applies the
//! tier multiplier.

use crate::profile::DifficultyTier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for the code-quality sub-score.
pub const CODE_QUALITY_MAX: u32 = 25;

/// Upper bound for the problem-solving sub-score.
pub const PROBLEM_SOLVING_MAX: u32 = 30;

/// Upper bound for the concept-understanding sub-score.
pub const CONCEPT_UNDERSTANDING_MAX: u32 = 20;

/// Upper bound for the best-practices sub-score.
pub const BEST_PRACTICES_MAX: u32 = 15;

/// Upper bound for the creativity sub-score.
pub const CREATIVITY_MAX: u32 = 10;

/// Errors from rubric validation.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("sub-score `{field}` is {value}, outside 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

/// The five-dimension sub-score breakdown of a submitted solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    /// Code quality, 0-25.
    pub code_quality: u32,

    /// Problem solving, 0-30.
    pub problem_solving: u32,

    /// Concept understanding, 0-20.
    pub concept_understanding: u32,

    /// Best practices, 0-15.
    pub best_practices: u32,

    /// Creativity, 0-10.
    pub creativity: u32,
}

impl Rubric {
    pub fn new(
        code_quality: u32,
        problem_solving: u32,
        concept_understanding: u32,
        best_practices: u32,
        creativity: u32,
    ) -> Self {
        Self {
            code_quality,
            problem_solving,
            concept_understanding,
            best_practices,
            creativity,
        }
    }

    /// A full-marks rubric, summing to 100.
    pub fn flawless() -> Self {
        Self::new(
            CODE_QUALITY_MAX,
            PROBLEM_SOLVING_MAX,
            CONCEPT_UNDERSTANDING_MAX,
            BEST_PRACTICES_MAX,
            CREATIVITY_MAX,
        )
    }

    /// Check every sub-score against its documented bound.
    ///
    /// The error names the first offending field.
    pub fn validate(&self) -> Result<(), ScoreError> {
        let checks = [
            ("code_quality", self.code_quality, CODE_QUALITY_MAX),
            ("problem_solving", self.problem_solving, PROBLEM_SOLVING_MAX),
            (
                "concept_understanding",
                self.concept_understanding,
                CONCEPT_UNDERSTANDING_MAX,
            ),
            ("best_practices", self.best_practices, BEST_PRACTICES_MAX),
            ("creativity", self.creativity, CREATIVITY_MAX),
        ];

        for (field, value, max) in checks {
            if value > max {
                return Err(ScoreError::OutOfRange { field, value, max });
            }
        }
        Ok(())
    }

    /// Base XP: the plain sum of sub-scores, 0-100 for a valid rubric.
    pub fn total(&self) -> u32 {
        self.code_quality
            + self.problem_solving
            + self.concept_understanding
            + self.best_practices
            + self.creativity
    }

    /// Whether every dimension scored its maximum.
    pub fn is_flawless(&self) -> bool {
        *self == Self::flawless()
    }
}

/// Compute the XP award for a validated rubric at a tier.
///
/// `awarded = round(sum(rubric) * multiplier(tier))`, ties rounding away
/// from zero. Deterministic for identical inputs.
pub fn score(rubric: &Rubric, tier: DifficultyTier) -> Result<u64, ScoreError> {
    rubric.validate()?;
    let base = f64::from(rubric.total());
    Ok((base * tier.multiplier()).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_rubric_at_journeyman_awards_200() {
        let awarded = score(&Rubric::flawless(), DifficultyTier::Journeyman).unwrap();
        assert_eq!(awarded, 200);
    }

    #[test]
    fn test_half_rubric_at_newbie_awards_50() {
        let rubric = Rubric::new(15, 15, 10, 5, 5);
        assert_eq!(rubric.total(), 50);

        let awarded = score(&rubric, DifficultyTier::Newbie).unwrap();
        assert_eq!(awarded, 50);
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        // 1 * 1.5 = 1.5 rounds to 2, 3 * 2.5 = 7.5 rounds to 8.
        let one = Rubric::new(1, 0, 0, 0, 0);
        assert_eq!(score(&one, DifficultyTier::Apprentice).unwrap(), 2);

        let three = Rubric::new(3, 0, 0, 0, 0);
        assert_eq!(score(&three, DifficultyTier::Expert).unwrap(), 8);
    }

    #[test]
    fn test_score_is_deterministic() {
        let rubric = Rubric::new(20, 25, 15, 10, 5);
        let first = score(&rubric, DifficultyTier::Master).unwrap();
        let second = score(&rubric, DifficultyTier::Master).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_names_offending_field() {
        let rubric = Rubric::new(0, 31, 0, 0, 0);
        let err = score(&rubric, DifficultyTier::Newbie).unwrap_err();
        let ScoreError::OutOfRange { field, value, max } = err;
        assert_eq!(field, "problem_solving");
        assert_eq!(value, 31);
        assert_eq!(max, 30);
    }

    #[test]
    fn test_creativity_bound_checked() {
        let rubric = Rubric::new(0, 0, 0, 0, 11);
        let err = rubric.validate().unwrap_err();
        assert!(err.to_string().contains("creativity"));
    }

    #[test]
    fn test_every_tier_scales_the_same_base() {
        let rubric = Rubric::new(10, 10, 10, 10, 10);
        let mut last = 0;
        for tier in DifficultyTier::ALL {
            let awarded = score(&rubric, tier).unwrap();
            assert!(awarded >= last);
            last = awarded;
        }
        assert_eq!(last, 150); // 50 * 3.0 at Master
    }
}
