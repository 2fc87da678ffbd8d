use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use learncredit_common::access::RoleStore;
use learncredit_common::wallet::WalletContract;

#[cw_serde]
pub struct Config {
    /// Student wallet credited by approved disbursements
    pub wallet_contract: WalletContract,
    pub paused: bool,
}

/// Running totals across all schools.
///
/// Sum of school balances == total_donated - total_disbursed - total_withdrawn
#[cw_serde]
#[derive(Default)]
pub struct PoolStats {
    pub total_donated: Uint128,
    pub total_disbursed: Uint128,
    pub total_withdrawn: Uint128,
    pub donation_count: u64,
}

#[cw_serde]
pub struct Contribution {
    pub id: u64,
    pub donor: Addr,
    pub school: String,
    pub amount: Uint128,
    pub timestamp: Timestamp,
}

#[cw_serde]
pub enum DisbursementStatus {
    Pending,
    /// Pool debited, wallet credit in flight
    Approved,
    Rejected,
    /// Wallet credit confirmed
    Completed,
}

impl DisbursementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementStatus::Pending => "pending",
            DisbursementStatus::Approved => "approved",
            DisbursementStatus::Rejected => "rejected",
            DisbursementStatus::Completed => "completed",
        }
    }
}

#[cw_serde]
pub struct DisbursementRequest {
    pub id: u64,
    pub student: Addr,
    pub school: String,
    pub amount: Uint128,
    pub status: DisbursementStatus,
    pub requested_by: Addr,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<Addr>,
}

pub const CONFIG: Item<Config> = Item::new("config");

pub const AUTH: RoleStore = RoleStore;

/// school -> available balance
pub const SCHOOL_BALANCES: Map<&str, Uint128> = Map::new("school_balances");

pub const POOL_STATS: Item<PoolStats> = Item::new("pool_stats");

/// donation_id -> Contribution
pub const DONATIONS: Map<u64, Contribution> = Map::new("donations");

pub const NEXT_DONATION_ID: Item<u64> = Item::new("next_donation_id");

/// (donor, school) -> contributed minus withdrawn
pub const DONOR_BALANCES: Map<(&Addr, &str), Uint128> = Map::new("donor_balances");

/// request_id -> DisbursementRequest
pub const REQUESTS: Map<u64, DisbursementRequest> = Map::new("requests");

/// Index of requests still awaiting a decision
pub const PENDING_REQUESTS: Map<u64, ()> = Map::new("pending_requests");

pub const NEXT_REQUEST_ID: Item<u64> = Item::new("next_request_id");
