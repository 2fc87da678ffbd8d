//! Quiz scoring: turning answers into reward points.
//!
//! How a score maps to points is a deployment choice, so the mapping is a
//! policy value stored in the reward ledger's config rather than a constant.

use cosmwasm_schema::cw_serde;
use thiserror::Error;

/// Minimum percentage (inclusive) for a quiz attempt to earn anything.
pub const PASSING_PERCENTAGE: u64 = 60;

#[derive(Error, Debug, PartialEq)]
pub enum ScoringError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("{correct} correct answers out of {total} questions")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

#[cw_serde]
#[derive(Copy)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
}

impl QuizScore {
    pub fn new(correct: u32, total: u32) -> Result<Self, ScoringError> {
        if total == 0 {
            return Err(ScoringError::NoQuestions);
        }
        if correct > total {
            return Err(ScoringError::CorrectExceedsTotal { correct, total });
        }
        Ok(QuizScore { correct, total })
    }

    /// Percentage of correct answers, rounded half up.
    pub fn percentage(&self) -> u64 {
        let correct = self.correct as u64;
        let total = self.total as u64;
        (correct * 100 + total / 2) / total
    }

    pub fn passed(&self) -> bool {
        self.percentage() >= PASSING_PERCENTAGE
    }
}

#[cw_serde]
#[derive(Default)]
pub enum ScoringPolicy {
    /// `round(percentage / 100 * quiz_reward)`
    #[default]
    Proportional,
    /// `correct * points_per_answer`
    PerCorrectAnswer { points_per_answer: u64 },
}

impl ScoringPolicy {
    /// Points earned for a scored attempt. Failing attempts earn nothing.
    pub fn points(&self, score: &QuizScore, quiz_reward: u64) -> u64 {
        if !score.passed() {
            return 0;
        }
        match self {
            ScoringPolicy::Proportional => {
                let scaled = (score.percentage() as u128 * quiz_reward as u128 + 50) / 100;
                // percentage <= 100, so the result never exceeds quiz_reward
                scaled as u64
            }
            ScoringPolicy::PerCorrectAnswer { points_per_answer } => {
                (score.correct as u64).saturating_mul(*points_per_answer)
            }
        }
    }
}
