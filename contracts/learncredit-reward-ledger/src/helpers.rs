use cosmwasm_std::{Addr, Api, MessageInfo, Storage};
use learncredit_common::access::{Authorizer, Operation};

use crate::error::ContractError;
use crate::state::CONFIG;

/// Largest batch accepted by `BatchAwardCredits`.
pub const MAX_BATCH_SIZE: usize = 100;

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
    Err(ContractError::Unauthorized {
        role: "admin".to_string(),
    })
}

pub fn assert_not_paused(storage: &dyn Storage) -> Result<(), ContractError> {
    let config = CONFIG.load(storage)?;
    if config.paused {
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

/// Validate an account handle; the empty handle is the null account.
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

pub fn validate_points(points: u64) -> Result<(), ContractError> {
    if points == 0 {
        return Err(ContractError::InvalidInput {
            reason: "points must be positive".to_string(),
        });
    }
    Ok(())
}

pub fn validate_batch_size(len: usize) -> Result<(), ContractError> {
    if len == 0 {
        return Err(ContractError::InvalidInput {
            reason: "batch is empty".to_string(),
        });
    }
    if len > MAX_BATCH_SIZE {
        return Err(ContractError::InvalidInput {
            reason: format!("batch of {} exceeds the limit of {}", len, MAX_BATCH_SIZE),
        });
    }
    Ok(())
}
