use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Event, Order, StdError, StdResult, Storage};
use cw_storage_plus::Map;
use thiserror::Error;

/// Role name -> account. Presence of the key is the grant.
const ROLES: Map<(&str, &Addr), ()> = Map::new("lc_roles");

/// (guardian, student) -> (): the students a guardian answers for
const GUARDIANS: Map<(&Addr, &Addr), ()> = Map::new("lc_guardians");

#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord)]
pub enum Role {
    /// Full privileged access, including role management
    Admin,
    /// Spending approvals and category management for assigned students
    Guardian,
    /// Contracts allowed to credit student wallets
    CreditIssuer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guardian => "guardian",
            Role::CreditIssuer => "credit_issuer",
        }
    }
}

/// Privileged transitions a caller can be authorized for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    AwardCredits,
    AwardTierBonus,
    CreateWallet,
    AddCredits,
    ApproveSpending,
    RejectSpending,
    UpdateAllowedCategory,
    EmergencyWithdraw,
    RequestDisbursementFor,
    ApproveDisbursement,
    RejectDisbursement,
    WithdrawDonation,
    ManageRoles,
    Pause,
    UpdateConfig,
}

impl Operation {
    /// Operations a guardian may perform for the students assigned to them.
    pub fn guardian_scoped(&self) -> bool {
        matches!(
            self,
            Operation::CreateWallet
                | Operation::ApproveSpending
                | Operation::RejectSpending
                | Operation::UpdateAllowedCategory
                | Operation::RequestDisbursementFor
                | Operation::ApproveDisbursement
                | Operation::RejectDisbursement
        )
    }

    /// Wallet credits only ever come from issuer contracts, never from a person.
    pub fn admin_allowed(&self) -> bool {
        !matches!(self, Operation::AddCredits)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AwardCredits => "award_credits",
            Operation::AwardTierBonus => "award_tier_bonus",
            Operation::CreateWallet => "create_wallet",
            Operation::AddCredits => "add_credits",
            Operation::ApproveSpending => "approve_spending",
            Operation::RejectSpending => "reject_spending",
            Operation::UpdateAllowedCategory => "update_allowed_category",
            Operation::EmergencyWithdraw => "emergency_withdraw",
            Operation::RequestDisbursementFor => "request_disbursement_for",
            Operation::ApproveDisbursement => "approve_disbursement",
            Operation::RejectDisbursement => "reject_disbursement",
            Operation::WithdrawDonation => "withdraw_donation",
            Operation::ManageRoles => "manage_roles",
            Operation::Pause => "pause",
            Operation::UpdateConfig => "update_config",
        }
    }
}

/// Capability check injected into every privileged handler.
///
/// `scope` is the student the operation acts on, when there is one.
/// Implementations must fail closed: an unknown caller or a scoped
/// operation without a scope is not authorized.
pub trait Authorizer {
    fn authorize(
        &self,
        storage: &dyn Storage,
        caller: &Addr,
        operation: Operation,
        scope: Option<&Addr>,
    ) -> StdResult<bool>;
}

#[derive(Error, Debug, PartialEq)]
pub enum AccessError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("cannot revoke the last admin")]
    LastAdmin,

    #[error("{account} does not hold the {role} role")]
    MissingRole { role: String, account: String },
}

#[cw_serde]
#[derive(Copy)]
pub enum RoleChangeKind {
    Grant,
    Revoke,
}

impl RoleChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleChangeKind::Grant => "grant",
            RoleChangeKind::Revoke => "revoke",
        }
    }
}

/// Audit record of a role or guardian-scope change.
#[cw_serde]
pub struct RoleChange {
    pub operator: Addr,
    pub role: Role,
    pub account: Addr,
    pub change: RoleChangeKind,
    /// Set when a guardian is assigned to or removed from a student
    pub student: Option<Addr>,
}

impl RoleChange {
    pub fn into_event(self) -> Event {
        let event = Event::new("learncredit_role")
            .add_attribute("operator", self.operator)
            .add_attribute("role", self.role.as_str())
            .add_attribute("account", self.account)
            .add_attribute("change", self.change.as_str());
        match self.student {
            Some(student) => event.add_attribute("student", student),
            None => event,
        }
    }
}

/// Storage-backed role tables shared by all LearnCredit contracts.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoleStore;

impl RoleStore {
    /// Seed the first admin at instantiation.
    pub fn initialize(&self, storage: &mut dyn Storage, admin: &Addr) -> StdResult<()> {
        ROLES.save(storage, (Role::Admin.as_str(), admin), &())
    }

    pub fn has_role(&self, storage: &dyn Storage, role: Role, account: &Addr) -> bool {
        ROLES.has(storage, (role.as_str(), account))
    }

    pub fn is_guardian(&self, storage: &dyn Storage, guardian: &Addr, student: &Addr) -> bool {
        self.has_role(storage, Role::Guardian, guardian)
            && GUARDIANS.has(storage, (guardian, student))
    }

    pub fn members(&self, storage: &dyn Storage, role: Role) -> StdResult<Vec<Addr>> {
        ROLES
            .prefix(role.as_str())
            .keys(storage, None, None, Order::Ascending)
            .collect()
    }

    pub fn grant(
        &self,
        storage: &mut dyn Storage,
        operator: &Addr,
        role: Role,
        account: &Addr,
    ) -> Result<RoleChange, AccessError> {
        ROLES.save(storage, (role.as_str(), account), &())?;
        Ok(RoleChange {
            operator: operator.clone(),
            role,
            account: account.clone(),
            change: RoleChangeKind::Grant,
            student: None,
        })
    }

    pub fn revoke(
        &self,
        storage: &mut dyn Storage,
        operator: &Addr,
        role: Role,
        account: &Addr,
    ) -> Result<RoleChange, AccessError> {
        if role == Role::Admin
            && self.has_role(storage, Role::Admin, account)
            && self.members(storage, Role::Admin)?.len() == 1
        {
            return Err(AccessError::LastAdmin);
        }
        ROLES.remove(storage, (role.as_str(), account));
        Ok(RoleChange {
            operator: operator.clone(),
            role,
            account: account.clone(),
            change: RoleChangeKind::Revoke,
            student: None,
        })
    }

    pub fn assign_guardian(
        &self,
        storage: &mut dyn Storage,
        operator: &Addr,
        guardian: &Addr,
        student: &Addr,
    ) -> Result<RoleChange, AccessError> {
        if !self.has_role(storage, Role::Guardian, guardian) {
            return Err(AccessError::MissingRole {
                role: Role::Guardian.as_str().to_string(),
                account: guardian.to_string(),
            });
        }
        GUARDIANS.save(storage, (guardian, student), &())?;
        Ok(RoleChange {
            operator: operator.clone(),
            role: Role::Guardian,
            account: guardian.clone(),
            change: RoleChangeKind::Grant,
            student: Some(student.clone()),
        })
    }

    pub fn remove_guardian(
        &self,
        storage: &mut dyn Storage,
        operator: &Addr,
        guardian: &Addr,
        student: &Addr,
    ) -> Result<RoleChange, AccessError> {
        GUARDIANS.remove(storage, (guardian, student));
        Ok(RoleChange {
            operator: operator.clone(),
            role: Role::Guardian,
            account: guardian.clone(),
            change: RoleChangeKind::Revoke,
            student: Some(student.clone()),
        })
    }
}

impl Authorizer for RoleStore {
    fn authorize(
        &self,
        storage: &dyn Storage,
        caller: &Addr,
        operation: Operation,
        scope: Option<&Addr>,
    ) -> StdResult<bool> {
        if operation.admin_allowed() && self.has_role(storage, Role::Admin, caller) {
            return Ok(true);
        }
        if operation == Operation::AddCredits {
            return Ok(self.has_role(storage, Role::CreditIssuer, caller));
        }
        if operation.guardian_scoped() {
            if let Some(student) = scope {
                return Ok(self.is_guardian(storage, caller, student));
            }
        }
        Ok(false)
    }
}
