use cosmwasm_std::{Addr, Api, MessageInfo, Storage};
use learncredit_common::access::{Authorizer, Operation};

use crate::error::ContractError;
use crate::state::{
    SpendingRequest, SpendingStatus, Wallet, CONFIG, SPENDING_REQUESTS, WALLETS,
};

/// Run the capability check and fail closed with `Unauthorized`.
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
        role: required_role(operation).to_string(),
    })
}

fn required_role(operation: Operation) -> &'static str {
    if operation == Operation::AddCredits {
        "a credit issuer"
    } else if operation.guardian_scoped() {
        "admin or the student's guardian"
    } else {
        "admin"
    }
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

pub fn load_wallet(storage: &dyn Storage, student: &Addr) -> Result<Wallet, ContractError> {
    WALLETS
        .may_load(storage, student)?
        .ok_or_else(|| ContractError::WalletNotFound {
            student: student.to_string(),
        })
}

pub fn load_request(storage: &dyn Storage, id: u64) -> Result<SpendingRequest, ContractError> {
    SPENDING_REQUESTS
        .may_load(storage, id)?
        .ok_or(ContractError::RequestNotFound { id })
}

pub fn assert_pending(request: &SpendingRequest) -> Result<(), ContractError> {
    if request.status != SpendingStatus::Pending {
        return Err(ContractError::NotPending { id: request.id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::{Timestamp, Uint128};

    #[test]
    fn debit_keeps_ledger_balanced() {
        let mut wallet = Wallet::new(Timestamp::from_seconds(0));
        wallet.credit(Uint128::new(1500)).unwrap();
        wallet.debit(Uint128::new(400)).unwrap();
        assert_eq!(wallet.balance, Uint128::new(1100));
        assert_eq!(wallet.total_earned - wallet.total_spent, wallet.balance);
    }

    #[test]
    fn overdraw_leaves_wallet_untouched() {
        let mut wallet = Wallet::new(Timestamp::from_seconds(0));
        wallet.credit(Uint128::new(100)).unwrap();
        let before = wallet.clone();
        let err = wallet.debit(Uint128::new(101)).unwrap_err();
        assert_eq!(
            err,
            ContractError::InsufficientBalance {
                needed: "101".to_string(),
                available: "100".to_string(),
            }
        );
        assert_eq!(wallet, before);
    }

    #[test]
    fn required_role_names() {
        assert_eq!(required_role(Operation::AddCredits), "a credit issuer");
        assert_eq!(
            required_role(Operation::ApproveSpending),
            "admin or the student's guardian"
        );
        assert_eq!(required_role(Operation::EmergencyWithdraw), "admin");
    }
}
