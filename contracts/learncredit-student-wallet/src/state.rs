use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use learncredit_common::access::RoleStore;

use crate::error::ContractError;

#[cw_serde]
pub struct Config {
    /// Blocks spending requests and approvals; credits still flow in
    pub paused: bool,
}

/// A student's spendable credit balance.
/// Invariant: `total_earned - total_spent == balance`.
#[cw_serde]
pub struct Wallet {
    pub balance: Uint128,
    pub total_earned: Uint128,
    pub total_spent: Uint128,
    pub created_at: Timestamp,
}

impl Wallet {
    pub fn new(created_at: Timestamp) -> Self {
        Wallet {
            balance: Uint128::zero(),
            total_earned: Uint128::zero(),
            total_spent: Uint128::zero(),
            created_at,
        }
    }

    pub fn credit(&mut self, amount: Uint128) -> Result<(), ContractError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .map_err(|_| ContractError::Overflow)?;
        self.total_earned = self
            .total_earned
            .checked_add(amount)
            .map_err(|_| ContractError::Overflow)?;
        Ok(())
    }

    pub fn debit(&mut self, amount: Uint128) -> Result<(), ContractError> {
        self.balance =
            self.balance
                .checked_sub(amount)
                .map_err(|_| ContractError::InsufficientBalance {
                    needed: amount.to_string(),
                    available: self.balance.to_string(),
                })?;
        self.total_spent = self
            .total_spent
            .checked_add(amount)
            .map_err(|_| ContractError::Overflow)?;
        Ok(())
    }
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum SpendingCategory {
    Food,
    Transport,
    Books,
    Entertainment,
    Utilities,
    Other,
}

impl SpendingCategory {
    pub const ALL: [SpendingCategory; 6] = [
        SpendingCategory::Food,
        SpendingCategory::Transport,
        SpendingCategory::Books,
        SpendingCategory::Entertainment,
        SpendingCategory::Utilities,
        SpendingCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendingCategory::Food => "food",
            SpendingCategory::Transport => "transport",
            SpendingCategory::Books => "books",
            SpendingCategory::Entertainment => "entertainment",
            SpendingCategory::Utilities => "utilities",
            SpendingCategory::Other => "other",
        }
    }
}

#[cw_serde]
#[derive(Copy)]
pub enum SpendingStatus {
    Pending,
    /// Approved and settled: the wallet has been debited
    Approved,
    Rejected,
}

#[cw_serde]
pub struct SpendingRequest {
    pub id: u64,
    pub student: Addr,
    pub amount: Uint128,
    pub category: SpendingCategory,
    pub merchant: String,
    pub status: SpendingStatus,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<Addr>,
}

pub const CONFIG: Item<Config> = Item::new("config");

pub const AUTH: RoleStore = RoleStore;

/// student -> Wallet
pub const WALLETS: Map<&Addr, Wallet> = Map::new("wallets");

/// (student, category) -> (); absent means denied
pub const ALLOWED_CATEGORIES: Map<(&Addr, &str), ()> = Map::new("allowed_cats");

/// request_id -> SpendingRequest
pub const SPENDING_REQUESTS: Map<u64, SpendingRequest> = Map::new("spend_reqs");

/// (student, request_id) -> (), scanned by student prefix
pub const STUDENT_REQUESTS: Map<(&Addr, u64), ()> = Map::new("student_reqs");

/// request_id -> () for requests still Pending
pub const PENDING_REQUESTS: Map<u64, ()> = Map::new("pending_reqs");

/// Id the next spending request will get
pub const NEXT_REQUEST_ID: Item<u64> = Item::new("next_req_id");
