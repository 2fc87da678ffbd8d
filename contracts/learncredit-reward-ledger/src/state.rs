use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use learncredit_common::access::RoleStore;
use learncredit_common::scoring::ScoringPolicy;
use learncredit_common::wallet::WalletContract;

use crate::error::ContractError;
use crate::tier::{tier_for, Tier, TierBonus};

#[cw_serde]
pub struct Config {
    /// Student wallet contract that receives tier bonus credits
    pub wallet_contract: WalletContract,
    pub paused: bool,
    /// Maps scored quiz attempts to points
    pub scoring: ScoringPolicy,
}

/// Per-student point totals. The tier is derived, never stored.
#[cw_serde]
#[derive(Default)]
pub struct StudentRewards {
    pub total_points: u64,
    pub quizzes_completed: u32,
    /// Sum of tier bonuses credited to the wallet
    pub total_bonus: Uint128,
    pub silver_bonus_paid: bool,
    pub gold_bonus_paid: bool,
    pub last_award_at: Option<Timestamp>,
}

impl StudentRewards {
    pub fn tier(&self) -> Tier {
        tier_for(self.total_points)
    }

    pub fn bonus_paid(&self, tier: Tier) -> bool {
        match tier {
            Tier::Bronze => true,
            Tier::Silver => self.silver_bonus_paid,
            Tier::Gold => self.gold_bonus_paid,
        }
    }

    pub fn mark_bonus_paid(&mut self, bonus: &TierBonus) -> Result<(), ContractError> {
        self.total_bonus = self
            .total_bonus
            .checked_add(bonus.amount)
            .map_err(|_| ContractError::Overflow)?;
        match bonus.tier {
            Tier::Bronze => {}
            Tier::Silver => self.silver_bonus_paid = true,
            Tier::Gold => self.gold_bonus_paid = true,
        }
        Ok(())
    }
}

/// The outcome of the first award for a (student, quiz) pair, replayed on
/// every retry.
#[cw_serde]
pub struct QuizCompletion {
    pub points: u64,
    pub total_points_after: u64,
    pub tier_after: Tier,
    pub bonus: Option<TierBonus>,
    pub completed_at: Timestamp,
}

pub const CONFIG: Item<Config> = Item::new("config");

pub const AUTH: RoleStore = RoleStore;

/// student -> StudentRewards
pub const STUDENTS: Map<&Addr, StudentRewards> = Map::new("students");

/// (student, quiz_id) -> QuizCompletion, keyed for award idempotence
pub const COMPLETIONS: Map<(&Addr, u64), QuizCompletion> = Map::new("completions");
