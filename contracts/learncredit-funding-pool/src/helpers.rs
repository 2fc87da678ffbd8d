use cosmwasm_std::{Addr, Api, MessageInfo, Storage, Uint128};
use learncredit_common::access::{Authorizer, Operation};

use crate::error::ContractError;
use crate::state::{
    DisbursementRequest, DisbursementStatus, CONFIG, REQUESTS, SCHOOL_BALANCES,
};

/// Upper bound on a school identifier, in bytes.
pub const MAX_SCHOOL_LEN: usize = 64;

pub fn assert_authorized(
    auth: &dyn Authorizer,
    storage: &dyn Storage,
    caller: &Addr,
    operation: Operation,
    scope: Option<&Addr>,
) -> Result<(), ContractError> {
    if auth.authorize(storage, caller, operation, scope)? {
        return Ok(());
    }
    let role = if operation.guardian_scoped() {
        "admin or the student's guardian"
    } else {
        "admin"
    };
    Err(ContractError::Unauthorized {
        role: role.to_string(),
    })
}

pub fn assert_not_paused(storage: &dyn Storage) -> Result<(), ContractError> {
    if CONFIG.load(storage)?.paused {
        return Err(ContractError::SystemPaused);
    }
    Ok(())
}

pub fn reject_funds(info: &MessageInfo) -> Result<(), ContractError> {
    if !info.funds.is_empty() {
        return Err(ContractError::UnexpectedFunds);
    }
    Ok(())
}

pub fn validate_account(api: &dyn Api, account: &str) -> Result<Addr, ContractError> {
    if account.trim().is_empty() {
        return Err(ContractError::InvalidInput {
            reason: "account address is empty".to_string(),
        });
    }
    api.addr_validate(account)
        .map_err(|e| ContractError::InvalidInput {
            reason: format!("invalid account address {}: {}", account, e),
        })
}

/// Trimmed school identifier, non-empty and bounded.
pub fn validate_school(school: &str) -> Result<String, ContractError> {
    let school = school.trim();
    if school.is_empty() {
        return Err(ContractError::InvalidInput {
            reason: "school is empty".to_string(),
        });
    }
    if school.len() > MAX_SCHOOL_LEN {
        return Err(ContractError::InvalidInput {
            reason: format!("school exceeds {} bytes", MAX_SCHOOL_LEN),
        });
    }
    Ok(school.to_string())
}

pub fn validate_amount(amount: Uint128) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidInput {
            reason: "amount must be positive".to_string(),
        });
    }
    Ok(())
}

pub fn pool_balance(storage: &dyn Storage, school: &str) -> Result<Uint128, ContractError> {
    Ok(SCHOOL_BALANCES
        .may_load(storage, school)?
        .unwrap_or_default())
}

/// Take `amount` out of a school's pool, returning the new balance.
pub fn debit_school(
    storage: &mut dyn Storage,
    school: &str,
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let available = pool_balance(storage, school)?;
    let remaining = available
        .checked_sub(amount)
        .map_err(|_| ContractError::InsufficientPoolBalance {
            school: school.to_string(),
            needed: amount.to_string(),
            available: available.to_string(),
        })?;
    SCHOOL_BALANCES.save(storage, school, &remaining)?;
    Ok(remaining)
}

pub fn load_request(
    storage: &dyn Storage,
    id: u64,
) -> Result<DisbursementRequest, ContractError> {
    REQUESTS
        .may_load(storage, id)?
        .ok_or(ContractError::RequestNotFound { id })
}

pub fn assert_pending(request: &DisbursementRequest) -> Result<(), ContractError> {
    if request.status != DisbursementStatus::Pending {
        return Err(ContractError::NotPending { id: request.id });
    }
    Ok(())
}
