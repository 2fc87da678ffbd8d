use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};
use learncredit_common::access::Role;

use crate::state::{Contribution, DisbursementRequest, DisbursementStatus};

#[cw_serde]
pub struct InstantiateMsg {
    pub admin: String,
    /// Student wallet contract; this contract must hold its credit issuer role
    pub wallet_contract: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Contribute to a school's pool (anyone)
    Donate { school: String, amount: Uint128 },

    /// Ask for credits from a school's pool. `student` defaults to the
    /// sender; asking for someone else takes admin or their guardian.
    RequestDisbursement {
        school: String,
        amount: Uint128,
        student: Option<String>,
    },

    /// Debit the pool and credit the student's wallet, or change nothing
    ApproveDisbursement { request_id: u64 },
    RejectDisbursement { request_id: u64 },

    /// Return part of a donor's remaining contribution (admin only)
    WithdrawDonation {
        donor: String,
        school: String,
        amount: Uint128,
    },

    /// Pull funds out of a school's pool; `None` drains it (admin only)
    EmergencyWithdraw {
        school: String,
        amount: Option<Uint128>,
    },

    UpdateWalletContract { wallet_contract: String },

    Pause {},
    Unpause {},

    GrantRole { role: Role, account: String },
    RevokeRole { role: Role, account: String },
    AssignGuardian { guardian: String, student: String },
    RemoveGuardian { guardian: String, student: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(crate::state::Config)]
    Config {},

    #[returns(PoolBalanceResponse)]
    PoolBalance { school: String },

    #[returns(crate::state::PoolStats)]
    PoolStats {},

    #[returns(DonorBalanceResponse)]
    DonorBalance { donor: String, school: String },

    #[returns(RequestResponse)]
    Request { request_id: u64 },

    #[returns(RequestsResponse)]
    PendingRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(RequestsResponse)]
    AllRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(Contribution)]
    Donation { donation_id: u64 },

    #[returns(NextRequestIdResponse)]
    NextRequestId {},

    #[returns(HasRoleResponse)]
    HasRole { role: Role, account: String },

    #[returns(IsGuardianResponse)]
    IsGuardian { guardian: String, student: String },
}

#[cw_serde]
pub struct PoolBalanceResponse {
    pub school: String,
    pub balance: Uint128,
}

#[cw_serde]
pub struct DonorBalanceResponse {
    pub donor: Addr,
    pub school: String,
    pub balance: Uint128,
}

#[cw_serde]
pub struct RequestResponse {
    pub request: DisbursementRequest,
}

#[cw_serde]
pub struct RequestsResponse {
    pub requests: Vec<DisbursementRequest>,
}

#[cw_serde]
pub struct NextRequestIdResponse {
    pub next_request_id: u64,
}

#[cw_serde]
pub struct HasRoleResponse {
    pub has_role: bool,
}

#[cw_serde]
pub struct IsGuardianResponse {
    pub is_guardian: bool,
}

// ─── Response data ──────────────────────────────────────────────────────────

#[cw_serde]
pub struct DonationRecorded {
    pub donation_id: u64,
    pub school: String,
    pub school_balance: Uint128,
}

#[cw_serde]
pub struct DisbursementRequested {
    pub request_id: u64,
}

#[cw_serde]
pub struct DisbursementResolved {
    pub request_id: u64,
    pub status: DisbursementStatus,
    pub school_balance: Uint128,
}

#[cw_serde]
pub struct PoolWithdrawal {
    pub school: String,
    pub amount: Uint128,
    pub school_balance: Uint128,
}

#[cw_serde]
pub struct MigrateMsg {}
