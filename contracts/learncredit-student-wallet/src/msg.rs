use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Timestamp, Uint128};
use learncredit_common::access::Role;

use crate::state::{SpendingCategory, SpendingRequest, SpendingStatus};

#[cw_serde]
pub struct InstantiateMsg {
    /// Initial admin
    pub admin: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Open a wallet for a student. Creating an existing wallet is a no-op.
    CreateWallet { student: String },

    /// Credit a student's wallet (credit issuer contracts only).
    /// Wire-compatible with `learncredit_common::wallet::WalletExecuteMsg`.
    AddCredits {
        student: String,
        amount: Uint128,
        reason: String,
    },

    /// Sender asks to spend part of their balance at a merchant.
    /// Nothing is debited until the request is approved.
    RequestSpending {
        amount: Uint128,
        category: SpendingCategory,
        merchant: String,
    },

    /// Approve and settle a pending request (admin or guardian)
    ApproveSpending { request_id: u64 },

    /// Reject a pending request (admin or guardian)
    RejectSpending { request_id: u64 },

    /// Enable or disable a spending category for a student (admin or guardian)
    UpdateAllowedCategory {
        student: String,
        category: SpendingCategory,
        allowed: bool,
    },

    /// Debit a wallet outside the request flow (admin only, recovery use)
    EmergencyWithdraw { student: String, amount: Uint128 },

    Pause {},
    Unpause {},

    GrantRole { role: Role, account: String },
    RevokeRole { role: Role, account: String },

    /// Put a student under a guardian's responsibility
    AssignGuardian { guardian: String, student: String },
    RemoveGuardian { guardian: String, student: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(crate::state::Config)]
    Config {},

    #[returns(BalanceResponse)]
    Balance { student: String },

    #[returns(WalletInfoResponse)]
    WalletInfo { student: String },

    #[returns(HasWalletResponse)]
    HasWallet { student: String },

    #[returns(SpendingRequestResponse)]
    SpendingRequest { request_id: u64 },

    #[returns(NextRequestIdResponse)]
    NextRequestId {},

    #[returns(AllowedCategoriesResponse)]
    AllowedCategories { student: String },

    #[returns(SpendingRequestsResponse)]
    StudentRequests {
        student: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(SpendingRequestsResponse)]
    PendingRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(HasRoleResponse)]
    HasRole { role: Role, account: String },

    #[returns(IsGuardianResponse)]
    IsGuardian { guardian: String, student: String },
}

#[cw_serde]
pub struct BalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub struct WalletInfoResponse {
    pub student: Addr,
    pub exists: bool,
    pub balance: Uint128,
    pub total_earned: Uint128,
    pub total_spent: Uint128,
    pub created_at: Option<Timestamp>,
}

#[cw_serde]
pub struct HasWalletResponse {
    pub has_wallet: bool,
}

#[cw_serde]
pub struct SpendingRequestResponse {
    pub request: SpendingRequest,
}

#[cw_serde]
pub struct NextRequestIdResponse {
    pub next_request_id: u64,
}

#[cw_serde]
pub struct AllowedCategoriesResponse {
    pub categories: Vec<SpendingCategory>,
}

#[cw_serde]
pub struct SpendingRequestsResponse {
    pub requests: Vec<SpendingRequest>,
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
pub struct WalletCreated {
    pub student: Addr,
    /// false when the wallet already existed
    pub created: bool,
}

#[cw_serde]
pub struct CreditsAdded {
    pub student: Addr,
    pub amount: Uint128,
    pub balance: Uint128,
}

#[cw_serde]
pub struct SpendingRequestCreated {
    pub request_id: u64,
}

#[cw_serde]
pub struct SpendingResolved {
    pub request_id: u64,
    pub status: SpendingStatus,
    pub balance: Uint128,
}

#[cw_serde]
pub struct MigrateMsg {}
