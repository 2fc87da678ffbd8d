use cosmwasm_std::{
    entry_point, to_json_binary, Addr, Binary, Deps, DepsMut, Env, Event, MessageInfo, Order,
    Response, StdResult, Uint128,
};
use cw2::set_contract_version;
use cw_storage_plus::Bound;
use learncredit_common::access::{Operation, Role};
use learncredit_common::audit::audited_response;

use crate::error::ContractError;
use crate::helpers::{
    assert_authorized, assert_not_paused, assert_pending, load_request, load_wallet,
    reject_funds, validate_account,
};
use crate::msg::{
    AllowedCategoriesResponse, BalanceResponse, CreditsAdded, ExecuteMsg, HasRoleResponse,
    HasWalletResponse, InstantiateMsg, IsGuardianResponse, MigrateMsg, NextRequestIdResponse,
    QueryMsg, SpendingRequestCreated, SpendingRequestResponse, SpendingRequestsResponse,
    SpendingResolved, WalletCreated, WalletInfoResponse,
};
use crate::state::{
    Config, SpendingCategory, SpendingRequest, SpendingStatus, Wallet, ALLOWED_CATEGORIES, AUTH,
    CONFIG, NEXT_REQUEST_ID, PENDING_REQUESTS, SPENDING_REQUESTS, STUDENT_REQUESTS, WALLETS,
};

const CONTRACT_NAME: &str = "crates.io:learncredit-student-wallet";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
const AUDIT_TAG: &str = "wallet";

// ─── Instantiate ────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let admin = validate_account(deps.api, &msg.admin)?;
    CONFIG.save(deps.storage, &Config { paused: false })?;
    NEXT_REQUEST_ID.save(deps.storage, &1u64)?;
    AUTH.initialize(deps.storage, &admin)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", CONTRACT_NAME)
        .add_attribute("admin", admin.as_str()))
}

// ─── Execute ────────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateWallet { student } => execute_create_wallet(deps, env, info, student),
        ExecuteMsg::AddCredits {
            student,
            amount,
            reason,
        } => execute_add_credits(deps, env, info, student, amount, reason),
        ExecuteMsg::RequestSpending {
            amount,
            category,
            merchant,
        } => execute_request_spending(deps, env, info, amount, category, merchant),
        ExecuteMsg::ApproveSpending { request_id } => {
            execute_approve_spending(deps, env, info, request_id)
        }
        ExecuteMsg::RejectSpending { request_id } => {
            execute_reject_spending(deps, env, info, request_id)
        }
        ExecuteMsg::UpdateAllowedCategory {
            student,
            category,
            allowed,
        } => execute_update_allowed_category(deps, info, student, category, allowed),
        ExecuteMsg::EmergencyWithdraw { student, amount } => {
            execute_emergency_withdraw(deps, info, student, amount)
        }
        ExecuteMsg::Pause {} => execute_set_paused(deps, info, true),
        ExecuteMsg::Unpause {} => execute_set_paused(deps, info, false),
        ExecuteMsg::GrantRole { role, account } => execute_grant_role(deps, info, role, account),
        ExecuteMsg::RevokeRole { role, account } => {
            execute_revoke_role(deps, info, role, account)
        }
        ExecuteMsg::AssignGuardian { guardian, student } => {
            execute_assign_guardian(deps, info, guardian, student)
        }
        ExecuteMsg::RemoveGuardian { guardian, student } => {
            execute_remove_guardian(deps, info, guardian, student)
        }
    }
}

// ─── Wallet lifecycle ───────────────────────────────────────────────────────

pub fn execute_create_wallet(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    student: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    let student = validate_account(deps.api, &student)?;

    // students open their own wallet; anyone else needs the capability
    if info.sender != student {
        assert_authorized(
            &AUTH,
            deps.storage,
            &info.sender,
            Operation::CreateWallet,
            Some(&student),
        )?;
    }

    let created = !WALLETS.has(deps.storage, &student);
    if created {
        WALLETS.save(deps.storage, &student, &Wallet::new(env.block.time))?;
    }

    let res = audited_response(deps.storage, AUDIT_TAG, "create_wallet")?;
    Ok(res
        .add_attribute("student", student.as_str())
        .add_attribute("created", created.to_string())
        .set_data(to_json_binary(&WalletCreated { student, created })?))
}

pub fn execute_add_credits(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    student: String,
    amount: Uint128,
    reason: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    let student = validate_account(deps.api, &student)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::AddCredits,
        Some(&student),
    )?;

    if amount.is_zero() {
        return Err(ContractError::InvalidInput {
            reason: "credit amount must be positive".to_string(),
        });
    }

    // a bonus or disbursement may reach a student before they open a wallet
    let mut wallet = WALLETS
        .may_load(deps.storage, &student)?
        .unwrap_or_else(|| Wallet::new(env.block.time));
    wallet.credit(amount)?;
    WALLETS.save(deps.storage, &student, &wallet)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "add_credits")?;
    Ok(res
        .add_attribute("issuer", info.sender.as_str())
        .add_attribute("student", student.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("reason", reason)
        .add_attribute("balance", wallet.balance.to_string())
        .set_data(to_json_binary(&CreditsAdded {
            student,
            amount,
            balance: wallet.balance,
        })?))
}

// ─── Spending requests ──────────────────────────────────────────────────────

pub fn execute_request_spending(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    amount: Uint128,
    category: SpendingCategory,
    merchant: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_not_paused(deps.storage)?;

    if amount.is_zero() {
        return Err(ContractError::InvalidInput {
            reason: "spending amount must be positive".to_string(),
        });
    }
    let merchant = merchant.trim().to_string();
    if merchant.is_empty() {
        return Err(ContractError::InvalidInput {
            reason: "merchant is empty".to_string(),
        });
    }

    let student = info.sender;
    let wallet = load_wallet(deps.storage, &student)?;

    if !ALLOWED_CATEGORIES.has(deps.storage, (&student, category.as_str())) {
        return Err(ContractError::CategoryNotAllowed {
            category: category.as_str().to_string(),
        });
    }
    if amount > wallet.balance {
        return Err(ContractError::InsufficientBalance {
            needed: amount.to_string(),
            available: wallet.balance.to_string(),
        });
    }

    let request_id = NEXT_REQUEST_ID.load(deps.storage)?;
    let next_id = request_id.checked_add(1).ok_or(ContractError::Overflow)?;
    NEXT_REQUEST_ID.save(deps.storage, &next_id)?;

    let request = SpendingRequest {
        id: request_id,
        student: student.clone(),
        amount,
        category,
        merchant: merchant.clone(),
        status: SpendingStatus::Pending,
        created_at: env.block.time,
        resolved_at: None,
        resolved_by: None,
    };
    SPENDING_REQUESTS.save(deps.storage, request_id, &request)?;
    STUDENT_REQUESTS.save(deps.storage, (&student, request_id), &())?;
    PENDING_REQUESTS.save(deps.storage, request_id, &())?;

    let res = audited_response(deps.storage, AUDIT_TAG, "request_spending")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", student.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("category", category.as_str())
        .add_attribute("merchant", merchant)
        .set_data(to_json_binary(&SpendingRequestCreated { request_id })?))
}

pub fn execute_approve_spending(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_not_paused(deps.storage)?;

    let mut request = load_request(deps.storage, request_id)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::ApproveSpending,
        Some(&request.student),
    )?;
    assert_pending(&request)?;

    // the balance may have moved since the request was made
    let mut wallet = load_wallet(deps.storage, &request.student)?;
    wallet.debit(request.amount)?;
    WALLETS.save(deps.storage, &request.student, &wallet)?;

    request.status = SpendingStatus::Approved;
    request.resolved_at = Some(env.block.time);
    request.resolved_by = Some(info.sender.clone());
    SPENDING_REQUESTS.save(deps.storage, request_id, &request)?;
    PENDING_REQUESTS.remove(deps.storage, request_id);

    let res = audited_response(deps.storage, AUDIT_TAG, "approve_spending")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", request.student.as_str())
        .add_attribute("amount", request.amount.to_string())
        .add_attribute("approver", info.sender.as_str())
        .add_attribute("balance", wallet.balance.to_string())
        .set_data(to_json_binary(&SpendingResolved {
            request_id,
            status: SpendingStatus::Approved,
            balance: wallet.balance,
        })?))
}

pub fn execute_reject_spending(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;

    let mut request = load_request(deps.storage, request_id)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::RejectSpending,
        Some(&request.student),
    )?;
    assert_pending(&request)?;

    request.status = SpendingStatus::Rejected;
    request.resolved_at = Some(env.block.time);
    request.resolved_by = Some(info.sender.clone());
    SPENDING_REQUESTS.save(deps.storage, request_id, &request)?;
    PENDING_REQUESTS.remove(deps.storage, request_id);

    let balance = WALLETS
        .may_load(deps.storage, &request.student)?
        .map(|w| w.balance)
        .unwrap_or_default();

    let res = audited_response(deps.storage, AUDIT_TAG, "reject_spending")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", request.student.as_str())
        .add_attribute("rejected_by", info.sender.as_str())
        .set_data(to_json_binary(&SpendingResolved {
            request_id,
            status: SpendingStatus::Rejected,
            balance,
        })?))
}

pub fn execute_update_allowed_category(
    deps: DepsMut,
    info: MessageInfo,
    student: String,
    category: SpendingCategory,
    allowed: bool,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    let student = validate_account(deps.api, &student)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::UpdateAllowedCategory,
        Some(&student),
    )?;

    let key = (&student, category.as_str());
    if allowed {
        ALLOWED_CATEGORIES.save(deps.storage, key, &())?;
    } else {
        ALLOWED_CATEGORIES.remove(deps.storage, key);
    }

    let res = audited_response(deps.storage, AUDIT_TAG, "update_allowed_category")?;
    Ok(res
        .add_attribute("student", student.as_str())
        .add_attribute("category", category.as_str())
        .add_attribute("allowed", allowed.to_string())
        .add_attribute("operator", info.sender.as_str()))
}

pub fn execute_emergency_withdraw(
    deps: DepsMut,
    info: MessageInfo,
    student: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::EmergencyWithdraw,
        None,
    )?;

    let student = validate_account(deps.api, &student)?;
    if amount.is_zero() {
        return Err(ContractError::InvalidInput {
            reason: "withdrawal amount must be positive".to_string(),
        });
    }

    let mut wallet = load_wallet(deps.storage, &student)?;
    wallet.debit(amount)?;
    WALLETS.save(deps.storage, &student, &wallet)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "emergency_withdraw")?;
    Ok(res
        .add_attribute("student", student.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("balance", wallet.balance.to_string())
        .add_event(
            Event::new("learncredit_emergency")
                .add_attribute("contract", AUDIT_TAG)
                .add_attribute("operator", info.sender.as_str())
                .add_attribute("student", student.as_str())
                .add_attribute("amount", amount.to_string()),
        ))
}

// ─── Admin ──────────────────────────────────────────────────────────────────

pub fn execute_set_paused(
    deps: DepsMut,
    info: MessageInfo,
    paused: bool,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::Pause, None)?;

    let config = CONFIG.load(deps.storage)?;
    if !paused && !config.paused {
        return Err(ContractError::NotPaused);
    }
    CONFIG.save(deps.storage, &Config { paused })?;

    let action = if paused { "pause" } else { "unpause" };
    let res = audited_response(deps.storage, AUDIT_TAG, action)?;
    Ok(res.add_attribute("operator", info.sender.as_str()))
}

pub fn execute_grant_role(
    deps: DepsMut,
    info: MessageInfo,
    role: Role,
    account: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::ManageRoles, None)?;
    let account = validate_account(deps.api, &account)?;

    let change = AUTH.grant(deps.storage, &info.sender, role, &account)?;
    let res = audited_response(deps.storage, AUDIT_TAG, "grant_role")?;
    Ok(res.add_event(change.into_event()))
}

pub fn execute_revoke_role(
    deps: DepsMut,
    info: MessageInfo,
    role: Role,
    account: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::ManageRoles, None)?;
    let account = validate_account(deps.api, &account)?;

    let change = AUTH.revoke(deps.storage, &info.sender, role, &account)?;
    let res = audited_response(deps.storage, AUDIT_TAG, "revoke_role")?;
    Ok(res.add_event(change.into_event()))
}

pub fn execute_assign_guardian(
    deps: DepsMut,
    info: MessageInfo,
    guardian: String,
    student: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::ManageRoles, None)?;
    let guardian = validate_account(deps.api, &guardian)?;
    let student = validate_account(deps.api, &student)?;

    let change = AUTH.assign_guardian(deps.storage, &info.sender, &guardian, &student)?;
    let res = audited_response(deps.storage, AUDIT_TAG, "assign_guardian")?;
    Ok(res.add_event(change.into_event()))
}

pub fn execute_remove_guardian(
    deps: DepsMut,
    info: MessageInfo,
    guardian: String,
    student: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::ManageRoles, None)?;
    let guardian = validate_account(deps.api, &guardian)?;
    let student = validate_account(deps.api, &student)?;

    let change = AUTH.remove_guardian(deps.storage, &info.sender, &guardian, &student)?;
    let res = audited_response(deps.storage, AUDIT_TAG, "remove_guardian")?;
    Ok(res.add_event(change.into_event()))
}

// ─── Queries ────────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::Balance { student } => query_balance(deps, student),
        QueryMsg::WalletInfo { student } => query_wallet_info(deps, student),
        QueryMsg::HasWallet { student } => {
            let student = deps.api.addr_validate(&student)?;
            to_json_binary(&HasWalletResponse {
                has_wallet: WALLETS.has(deps.storage, &student),
            })
        }
        QueryMsg::SpendingRequest { request_id } => to_json_binary(&SpendingRequestResponse {
            request: SPENDING_REQUESTS.load(deps.storage, request_id)?,
        }),
        QueryMsg::NextRequestId {} => to_json_binary(&NextRequestIdResponse {
            next_request_id: NEXT_REQUEST_ID.load(deps.storage)?,
        }),
        QueryMsg::AllowedCategories { student } => query_allowed_categories(deps, student),
        QueryMsg::StudentRequests {
            student,
            start_after,
            limit,
        } => query_student_requests(deps, student, start_after, limit),
        QueryMsg::PendingRequests { start_after, limit } => {
            query_pending_requests(deps, start_after, limit)
        }
        QueryMsg::HasRole { role, account } => {
            let account = deps.api.addr_validate(&account)?;
            to_json_binary(&HasRoleResponse {
                has_role: AUTH.has_role(deps.storage, role, &account),
            })
        }
        QueryMsg::IsGuardian { guardian, student } => {
            let guardian = deps.api.addr_validate(&guardian)?;
            let student = deps.api.addr_validate(&student)?;
            to_json_binary(&IsGuardianResponse {
                is_guardian: AUTH.is_guardian(deps.storage, &guardian, &student),
            })
        }
    }
}

fn query_balance(deps: Deps, student: String) -> StdResult<Binary> {
    let student = deps.api.addr_validate(&student)?;
    let balance = WALLETS
        .may_load(deps.storage, &student)?
        .map(|w| w.balance)
        .unwrap_or_default();
    to_json_binary(&BalanceResponse { balance })
}

fn query_wallet_info(deps: Deps, student: String) -> StdResult<Binary> {
    let student = deps.api.addr_validate(&student)?;
    let resp = match WALLETS.may_load(deps.storage, &student)? {
        Some(w) => WalletInfoResponse {
            student,
            exists: true,
            balance: w.balance,
            total_earned: w.total_earned,
            total_spent: w.total_spent,
            created_at: Some(w.created_at),
        },
        None => WalletInfoResponse {
            student,
            exists: false,
            balance: Uint128::zero(),
            total_earned: Uint128::zero(),
            total_spent: Uint128::zero(),
            created_at: None,
        },
    };
    to_json_binary(&resp)
}

fn query_allowed_categories(deps: Deps, student: String) -> StdResult<Binary> {
    let student = deps.api.addr_validate(&student)?;
    let categories = SpendingCategory::ALL
        .into_iter()
        .filter(|c| ALLOWED_CATEGORIES.has(deps.storage, (&student, c.as_str())))
        .collect();
    to_json_binary(&AllowedCategoriesResponse { categories })
}

fn query_student_requests(
    deps: Deps,
    student: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let student: Addr = deps.api.addr_validate(&student)?;
    let limit = limit.unwrap_or(30).min(100) as usize;
    let min_bound = start_after.map(Bound::exclusive);

    let requests: Vec<SpendingRequest> = STUDENT_REQUESTS
        .prefix(&student)
        .keys(deps.storage, min_bound, None, Order::Ascending)
        .take(limit)
        .map(|r| {
            let id = r?;
            SPENDING_REQUESTS.load(deps.storage, id)
        })
        .collect::<StdResult<_>>()?;

    to_json_binary(&SpendingRequestsResponse { requests })
}

fn query_pending_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let min_bound = start_after.map(Bound::exclusive);

    let requests: Vec<SpendingRequest> = PENDING_REQUESTS
        .keys(deps.storage, min_bound, None, Order::Ascending)
        .take(limit)
        .map(|r| {
            let id = r?;
            SPENDING_REQUESTS.load(deps.storage, id)
        })
        .collect::<StdResult<_>>()?;

    to_json_binary(&SpendingRequestsResponse { requests })
}

// ─── Migrate ────────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
