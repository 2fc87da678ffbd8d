//! Achievement tiers derived from cumulative quiz points.
//!
//! Bronze [0, 50], Silver [51, 100], Gold [101, ..). Tiers are never stored:
//! every reader recomputes them from the point total, so the two cannot drift.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

pub const SILVER_THRESHOLD: u64 = 51;
pub const GOLD_THRESHOLD: u64 = 101;

pub const SILVER_BONUS: u128 = 1_000;
pub const GOLD_BONUS: u128 = 2_000;

/// Declaration order is the tier order: Bronze < Silver < Gold.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }

    /// One-time credit granted on first reaching this tier.
    pub fn bonus_amount(&self) -> Option<Uint128> {
        match self {
            Tier::Bronze => None,
            Tier::Silver => Some(Uint128::new(SILVER_BONUS)),
            Tier::Gold => Some(Uint128::new(GOLD_BONUS)),
        }
    }
}

#[cw_serde]
pub struct TierBonus {
    pub tier: Tier,
    pub amount: Uint128,
}

impl TierBonus {
    /// Reason string attached to the wallet credit.
    pub fn reason(&self) -> String {
        format!("tier_bonus:{}", self.tier.as_str())
    }
}

pub fn tier_for(points: u64) -> Tier {
    if points >= GOLD_THRESHOLD {
        Tier::Gold
    } else if points >= SILVER_THRESHOLD {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// Bonus due when moving from `previous` to `new`. Only a strict upward move
/// earns one; a skipped tier is not paid here.
pub fn bonus_for(previous: Tier, new: Tier) -> Option<TierBonus> {
    if new <= previous {
        return None;
    }
    new.bonus_amount().map(|amount| TierBonus { tier: new, amount })
}
