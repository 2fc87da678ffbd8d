use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};
use learncredit_common::access::Role;
use learncredit_common::scoring::ScoringPolicy;

use crate::state::QuizCompletion;
use crate::tier::{Tier, TierBonus};

#[cw_serde]
pub struct InstantiateMsg {
    /// Initial admin
    pub admin: String,
    /// Student wallet contract; this contract must hold its credit issuer role
    pub wallet_contract: String,
    /// Defaults to proportional scoring
    pub scoring: Option<ScoringPolicy>,
}

#[cw_serde]
pub struct AwardEntry {
    pub student: String,
    pub quiz_id: u64,
    pub points: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Record a quiz completion and its points (admin only).
    /// Re-submitting a recorded (student, quiz_id) changes nothing.
    AwardCredits {
        student: String,
        quiz_id: u64,
        points: u64,
    },

    /// Apply several awards; one failing entry does not undo the others
    BatchAwardCredits { awards: Vec<AwardEntry> },

    /// Score a quiz attempt with the configured policy and award the result
    SubmitQuizCompletion {
        student: String,
        quiz_id: u64,
        correct_answers: u32,
        total_questions: u32,
        /// Nominal reward of the quiz, used by proportional scoring
        quiz_reward: u64,
    },

    /// Pay a tier bonus the student has reached but never received,
    /// e.g. Silver after jumping straight from Bronze to Gold
    ManualAwardTierBonus { student: String, tier: Tier },

    UpdateWalletContract { wallet_contract: String },
    UpdateScoringPolicy { scoring: ScoringPolicy },

    Pause {},
    Unpause {},

    GrantRole { role: Role, account: String },
    RevokeRole { role: Role, account: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(crate::state::Config)]
    Config {},

    #[returns(StudentRewardsResponse)]
    StudentRewards { student: String },

    #[returns(TierResponse)]
    StudentTier { student: String },

    #[returns(QuizCompletedResponse)]
    QuizCompleted { student: String, quiz_id: u64 },

    #[returns(Option<QuizCompletion>)]
    QuizCompletion { student: String, quiz_id: u64 },

    #[returns(CompletedQuizzesResponse)]
    CompletedQuizzes {
        student: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(ThresholdsResponse)]
    Thresholds {},

    #[returns(HasRoleResponse)]
    HasRole { role: Role, account: String },
}

#[cw_serde]
pub struct StudentRewardsResponse {
    pub student: Addr,
    pub total_points: u64,
    pub quizzes_completed: u32,
    pub tier: Tier,
    pub total_bonus: Uint128,
    pub silver_bonus_paid: bool,
    pub gold_bonus_paid: bool,
}

#[cw_serde]
pub struct TierResponse {
    pub tier: Tier,
}

#[cw_serde]
pub struct QuizCompletedResponse {
    pub completed: bool,
}

#[cw_serde]
pub struct CompletedQuizzesResponse {
    pub quiz_ids: Vec<u64>,
}

#[cw_serde]
pub struct ThresholdsResponse {
    pub silver_threshold: u64,
    pub gold_threshold: u64,
    pub silver_bonus: Uint128,
    pub gold_bonus: Uint128,
}

#[cw_serde]
pub struct HasRoleResponse {
    pub has_role: bool,
}

// ─── Response data ──────────────────────────────────────────────────────────

#[cw_serde]
pub struct AwardResult {
    pub student: Addr,
    pub quiz_id: u64,
    pub points_awarded: u64,
    pub total_points: u64,
    pub tier: Tier,
    pub bonus: Option<TierBonus>,
    /// true when this was a retry of an already recorded completion
    pub already_completed: bool,
}

#[cw_serde]
pub enum AwardOutcome {
    Awarded { result: AwardResult },
    AlreadyCompleted { result: AwardResult },
    Failed {
        student: String,
        quiz_id: u64,
        error: String,
    },
}

#[cw_serde]
pub struct BatchAwardResponse {
    pub outcomes: Vec<AwardOutcome>,
}

#[cw_serde]
pub struct QuizSubmissionResult {
    pub percentage: u64,
    pub passed: bool,
    pub points: u64,
    /// None when the attempt earned nothing
    pub award: Option<AwardResult>,
}

#[cw_serde]
pub struct ManualBonusResult {
    pub student: Addr,
    pub tier: Tier,
    /// false when the bonus had already been paid
    pub granted: bool,
    pub amount: Uint128,
}

#[cw_serde]
pub struct MigrateMsg {}
