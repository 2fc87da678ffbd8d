use cosmwasm_std::{
    entry_point, to_json_binary, Addr, Binary, Deps, DepsMut, Env, Event, MessageInfo, Order,
    Reply, Response, StdResult, SubMsg, Uint128,
};
use cw2::set_contract_version;
use cw_storage_plus::Bound;
use learncredit_common::access::{Operation, Role};
use learncredit_common::audit::audited_response;
use learncredit_common::wallet::{CreditSink, WalletContract};

use crate::error::ContractError;
use crate::helpers::{
    assert_authorized, assert_not_paused, assert_pending, debit_school, load_request,
    reject_funds, pool_balance, validate_account, validate_amount, validate_school,
};
use crate::msg::{
    DisbursementRequested, DisbursementResolved, DonationRecorded, DonorBalanceResponse,
    ExecuteMsg, HasRoleResponse, InstantiateMsg, IsGuardianResponse, MigrateMsg,
    NextRequestIdResponse, PoolBalanceResponse, PoolWithdrawal, QueryMsg, RequestResponse,
    RequestsResponse,
};
use crate::state::{
    Config, Contribution, DisbursementRequest, DisbursementStatus, PoolStats, AUTH, CONFIG,
    DONATIONS, DONOR_BALANCES, NEXT_DONATION_ID, NEXT_REQUEST_ID, PENDING_REQUESTS, POOL_STATS,
    REQUESTS, SCHOOL_BALANCES,
};

const CONTRACT_NAME: &str = "crates.io:learncredit-funding-pool";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
const AUDIT_TAG: &str = "pool";

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
    let wallet_contract = validate_account(deps.api, &msg.wallet_contract)?;
    CONFIG.save(
        deps.storage,
        &Config {
            wallet_contract: WalletContract(wallet_contract.clone()),
            paused: false,
        },
    )?;
    POOL_STATS.save(deps.storage, &PoolStats::default())?;
    NEXT_DONATION_ID.save(deps.storage, &1u64)?;
    NEXT_REQUEST_ID.save(deps.storage, &1u64)?;
    AUTH.initialize(deps.storage, &admin)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", CONTRACT_NAME)
        .add_attribute("admin", admin.as_str())
        .add_attribute("wallet_contract", wallet_contract.as_str()))
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
        ExecuteMsg::Donate { school, amount } => execute_donate(deps, env, info, school, amount),
        ExecuteMsg::RequestDisbursement {
            school,
            amount,
            student,
        } => execute_request_disbursement(deps, env, info, school, amount, student),
        ExecuteMsg::ApproveDisbursement { request_id } => {
            execute_approve_disbursement(deps, env, info, request_id)
        }
        ExecuteMsg::RejectDisbursement { request_id } => {
            execute_reject_disbursement(deps, env, info, request_id)
        }
        ExecuteMsg::WithdrawDonation {
            donor,
            school,
            amount,
        } => execute_withdraw_donation(deps, info, donor, school, amount),
        ExecuteMsg::EmergencyWithdraw { school, amount } => {
            execute_emergency_withdraw(deps, info, school, amount)
        }
        ExecuteMsg::UpdateWalletContract { wallet_contract } => {
            execute_update_wallet_contract(deps, info, wallet_contract)
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

// ─── Donations ──────────────────────────────────────────────────────────────

pub fn execute_donate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    school: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_not_paused(deps.storage)?;
    let school = validate_school(&school)?;
    validate_amount(amount)?;

    let donor = info.sender;
    let school_balance = pool_balance(deps.storage, &school)?
        .checked_add(amount)
        .map_err(|_| ContractError::Overflow)?;
    let donor_balance = DONOR_BALANCES
        .may_load(deps.storage, (&donor, school.as_str()))?
        .unwrap_or_default()
        .checked_add(amount)
        .map_err(|_| ContractError::Overflow)?;
    let mut stats = POOL_STATS.load(deps.storage)?;
    stats.total_donated = stats
        .total_donated
        .checked_add(amount)
        .map_err(|_| ContractError::Overflow)?;
    stats.donation_count = stats
        .donation_count
        .checked_add(1)
        .ok_or(ContractError::Overflow)?;

    let donation_id = NEXT_DONATION_ID.load(deps.storage)?;
    let next_id = donation_id.checked_add(1).ok_or(ContractError::Overflow)?;
    NEXT_DONATION_ID.save(deps.storage, &next_id)?;
    DONATIONS.save(
        deps.storage,
        donation_id,
        &Contribution {
            id: donation_id,
            donor: donor.clone(),
            school: school.clone(),
            amount,
            timestamp: env.block.time,
        },
    )?;
    SCHOOL_BALANCES.save(deps.storage, &school, &school_balance)?;
    DONOR_BALANCES.save(deps.storage, (&donor, school.as_str()), &donor_balance)?;
    POOL_STATS.save(deps.storage, &stats)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "donate")?;
    Ok(res
        .add_attribute("donation_id", donation_id.to_string())
        .add_attribute("donor", donor.as_str())
        .add_attribute("school", school.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("school_balance", school_balance.to_string())
        .set_data(to_json_binary(&DonationRecorded {
            donation_id,
            school,
            school_balance,
        })?))
}

pub fn execute_withdraw_donation(
    deps: DepsMut,
    info: MessageInfo,
    donor: String,
    school: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::WithdrawDonation,
        None,
    )?;
    let donor = validate_account(deps.api, &donor)?;
    let school = validate_school(&school)?;
    validate_amount(amount)?;

    let contributed = DONOR_BALANCES
        .may_load(deps.storage, (&donor, school.as_str()))?
        .unwrap_or_default();
    let remaining_contribution =
        contributed
            .checked_sub(amount)
            .map_err(|_| ContractError::InsufficientPoolBalance {
                school: school.clone(),
                needed: amount.to_string(),
                available: contributed.to_string(),
            })?;
    // part of the contribution may already be disbursed
    let school_balance = debit_school(deps.storage, &school, amount)?;

    let mut stats = POOL_STATS.load(deps.storage)?;
    stats.total_withdrawn = stats
        .total_withdrawn
        .checked_add(amount)
        .map_err(|_| ContractError::Overflow)?;
    POOL_STATS.save(deps.storage, &stats)?;
    DONOR_BALANCES.save(deps.storage, (&donor, school.as_str()), &remaining_contribution)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "withdraw_donation")?;
    Ok(res
        .add_attribute("donor", donor.as_str())
        .add_attribute("school", school.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("operator", info.sender.as_str())
        .set_data(to_json_binary(&PoolWithdrawal {
            school,
            amount,
            school_balance,
        })?))
}

pub fn execute_emergency_withdraw(
    deps: DepsMut,
    info: MessageInfo,
    school: String,
    amount: Option<Uint128>,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::EmergencyWithdraw,
        None,
    )?;
    let school = validate_school(&school)?;

    let available = pool_balance(deps.storage, &school)?;
    let amount = amount.unwrap_or(available);
    if amount.is_zero() {
        return Err(ContractError::InsufficientPoolBalance {
            school,
            needed: amount.to_string(),
            available: available.to_string(),
        });
    }
    let school_balance = debit_school(deps.storage, &school, amount)?;

    let mut stats = POOL_STATS.load(deps.storage)?;
    stats.total_withdrawn = stats
        .total_withdrawn
        .checked_add(amount)
        .map_err(|_| ContractError::Overflow)?;
    POOL_STATS.save(deps.storage, &stats)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "emergency_withdraw")?;
    Ok(res
        .add_attribute("school", school.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("school_balance", school_balance.to_string())
        .add_event(
            Event::new("learncredit_emergency")
                .add_attribute("contract", AUDIT_TAG)
                .add_attribute("operator", info.sender.as_str())
                .add_attribute("school", school.as_str())
                .add_attribute("amount", amount.to_string()),
        )
        .set_data(to_json_binary(&PoolWithdrawal {
            school,
            amount,
            school_balance,
        })?))
}

// ─── Disbursements ──────────────────────────────────────────────────────────

pub fn execute_request_disbursement(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    school: String,
    amount: Uint128,
    student: Option<String>,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_not_paused(deps.storage)?;
    let school = validate_school(&school)?;
    validate_amount(amount)?;

    let student: Addr = match student {
        Some(s) => validate_account(deps.api, &s)?,
        None => info.sender.clone(),
    };
    if student != info.sender {
        assert_authorized(
            &AUTH,
            deps.storage,
            &info.sender,
            Operation::RequestDisbursementFor,
            Some(&student),
        )?;
    }

    // the pool is only checked on approval
    let request_id = NEXT_REQUEST_ID.load(deps.storage)?;
    let next_id = request_id.checked_add(1).ok_or(ContractError::Overflow)?;
    NEXT_REQUEST_ID.save(deps.storage, &next_id)?;
    let request = DisbursementRequest {
        id: request_id,
        student: student.clone(),
        school: school.clone(),
        amount,
        status: DisbursementStatus::Pending,
        requested_by: info.sender.clone(),
        created_at: env.block.time,
        resolved_at: None,
        resolved_by: None,
    };
    REQUESTS.save(deps.storage, request_id, &request)?;
    PENDING_REQUESTS.save(deps.storage, request_id, &())?;

    let res = audited_response(deps.storage, AUDIT_TAG, "request_disbursement")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", student.as_str())
        .add_attribute("school", school.as_str())
        .add_attribute("amount", amount.to_string())
        .add_attribute("requested_by", info.sender.as_str())
        .set_data(to_json_binary(&DisbursementRequested { request_id })?))
}

pub fn execute_approve_disbursement(
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
        Operation::ApproveDisbursement,
        Some(&request.student),
    )?;
    assert_pending(&request)?;

    // balance is re-checked here; donations may have been withdrawn since
    let school_balance = debit_school(deps.storage, &request.school, request.amount)?;
    let mut stats = POOL_STATS.load(deps.storage)?;
    stats.total_disbursed = stats
        .total_disbursed
        .checked_add(request.amount)
        .map_err(|_| ContractError::Overflow)?;
    POOL_STATS.save(deps.storage, &stats)?;

    request.status = DisbursementStatus::Approved;
    request.resolved_at = Some(env.block.time);
    request.resolved_by = Some(info.sender.clone());
    REQUESTS.save(deps.storage, request_id, &request)?;
    PENDING_REQUESTS.remove(deps.storage, request_id);

    // wallet failure reverts everything above; success settles in `reply`
    let config = CONFIG.load(deps.storage)?;
    let credit = config.wallet_contract.credit_msg(
        &request.student,
        request.amount,
        &format!("disbursement:{}", request_id),
    )?;

    let res = audited_response(deps.storage, AUDIT_TAG, "approve_disbursement")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", request.student.as_str())
        .add_attribute("school", request.school.as_str())
        .add_attribute("amount", request.amount.to_string())
        .add_attribute("approver", info.sender.as_str())
        .add_submessage(SubMsg::reply_on_success(credit, request_id))
        .set_data(to_json_binary(&DisbursementResolved {
            request_id,
            status: DisbursementStatus::Approved,
            school_balance,
        })?))
}

pub fn execute_reject_disbursement(
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
        Operation::RejectDisbursement,
        Some(&request.student),
    )?;
    assert_pending(&request)?;

    request.status = DisbursementStatus::Rejected;
    request.resolved_at = Some(env.block.time);
    request.resolved_by = Some(info.sender.clone());
    REQUESTS.save(deps.storage, request_id, &request)?;
    PENDING_REQUESTS.remove(deps.storage, request_id);

    let school_balance = pool_balance(deps.storage, &request.school)?;
    let res = audited_response(deps.storage, AUDIT_TAG, "reject_disbursement")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", request.student.as_str())
        .add_attribute("rejected_by", info.sender.as_str())
        .set_data(to_json_binary(&DisbursementResolved {
            request_id,
            status: DisbursementStatus::Rejected,
            school_balance,
        })?))
}

// ─── Reply ──────────────────────────────────────────────────────────────────

/// Settles an approved disbursement once the wallet accepted the credit.
/// The reply id is the request id.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, _env: Env, msg: Reply) -> Result<Response, ContractError> {
    let request_id = msg.id;
    let mut request = REQUESTS
        .may_load(deps.storage, request_id)?
        .filter(|r| r.status == DisbursementStatus::Approved)
        .ok_or(ContractError::UnknownReply { id: request_id })?;

    request.status = DisbursementStatus::Completed;
    REQUESTS.save(deps.storage, request_id, &request)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "complete_disbursement")?;
    Ok(res
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("student", request.student.as_str())
        .add_attribute("status", request.status.as_str()))
}

// ─── Admin ──────────────────────────────────────────────────────────────────

pub fn execute_update_wallet_contract(
    deps: DepsMut,
    info: MessageInfo,
    wallet_contract: String,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::UpdateConfig, None)?;
    let wallet_contract = validate_account(deps.api, &wallet_contract)?;

    let mut config = CONFIG.load(deps.storage)?;
    config.wallet_contract = WalletContract(wallet_contract.clone());
    CONFIG.save(deps.storage, &config)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "update_wallet_contract")?;
    Ok(res
        .add_attribute("wallet_contract", wallet_contract.as_str())
        .add_attribute("operator", info.sender.as_str()))
}

pub fn execute_set_paused(
    deps: DepsMut,
    info: MessageInfo,
    paused: bool,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::Pause, None)?;

    let mut config = CONFIG.load(deps.storage)?;
    if !paused && !config.paused {
        return Err(ContractError::NotPaused);
    }
    config.paused = paused;
    CONFIG.save(deps.storage, &config)?;

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
        QueryMsg::PoolBalance { school } => {
            let school = school.trim().to_string();
            let balance = SCHOOL_BALANCES
                .may_load(deps.storage, &school)?
                .unwrap_or_default();
            to_json_binary(&PoolBalanceResponse { school, balance })
        }
        QueryMsg::PoolStats {} => to_json_binary(&POOL_STATS.load(deps.storage)?),
        QueryMsg::DonorBalance { donor, school } => {
            let donor = deps.api.addr_validate(&donor)?;
            let school = school.trim().to_string();
            let balance = DONOR_BALANCES
                .may_load(deps.storage, (&donor, school.as_str()))?
                .unwrap_or_default();
            to_json_binary(&DonorBalanceResponse {
                donor,
                school,
                balance,
            })
        }
        QueryMsg::Request { request_id } => to_json_binary(&RequestResponse {
            request: REQUESTS.load(deps.storage, request_id)?,
        }),
        QueryMsg::PendingRequests { start_after, limit } => {
            query_pending_requests(deps, start_after, limit)
        }
        QueryMsg::AllRequests { start_after, limit } => {
            query_all_requests(deps, start_after, limit)
        }
        QueryMsg::Donation { donation_id } => {
            to_json_binary(&DONATIONS.load(deps.storage, donation_id)?)
        }
        QueryMsg::NextRequestId {} => to_json_binary(&NextRequestIdResponse {
            next_request_id: NEXT_REQUEST_ID.load(deps.storage)?,
        }),
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

fn query_pending_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let min_bound = start_after.map(Bound::exclusive);

    let requests: Vec<DisbursementRequest> = PENDING_REQUESTS
        .keys(deps.storage, min_bound, None, Order::Ascending)
        .take(limit)
        .map(|r| {
            let id = r?;
            REQUESTS.load(deps.storage, id)
        })
        .collect::<StdResult<_>>()?;

    to_json_binary(&RequestsResponse { requests })
}

fn query_all_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let min_bound = start_after.map(Bound::exclusive);

    let requests: Vec<DisbursementRequest> = REQUESTS
        .range(deps.storage, min_bound, None, Order::Ascending)
        .take(limit)
        .map(|r| r.map(|(_, request)| request))
        .collect::<StdResult<_>>()?;

    to_json_binary(&RequestsResponse { requests })
}

// ─── Migrate ────────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
