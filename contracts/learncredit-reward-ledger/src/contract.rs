use cosmwasm_std::{
    entry_point, to_json_binary, Addr, Binary, CosmosMsg, Deps, DepsMut, Env, Event, MessageInfo,
    Order, Response, StdResult, Storage, Uint128,
};
use cw2::set_contract_version;
use cw_storage_plus::Bound;
use learncredit_common::access::{Operation, Role};
use learncredit_common::audit::audited_response;
use learncredit_common::scoring::{QuizScore, ScoringPolicy};
use learncredit_common::wallet::{CreditSink, WalletContract};

use crate::error::ContractError;
use crate::helpers::{
    assert_authorized, assert_not_paused, reject_funds, validate_account, validate_batch_size,
    validate_points,
};
use crate::msg::{
    AwardEntry, AwardOutcome, AwardResult, BatchAwardResponse, CompletedQuizzesResponse,
    ExecuteMsg, HasRoleResponse, InstantiateMsg, ManualBonusResult, MigrateMsg,
    QueryMsg, QuizCompletedResponse, QuizSubmissionResult, StudentRewardsResponse,
    ThresholdsResponse, TierResponse,
};
use crate::state::{Config, QuizCompletion, StudentRewards, AUTH, COMPLETIONS, CONFIG, STUDENTS};
use crate::tier::{
    bonus_for, Tier, TierBonus, GOLD_BONUS, GOLD_THRESHOLD, SILVER_BONUS, SILVER_THRESHOLD,
};

const CONTRACT_NAME: &str = "crates.io:learncredit-reward-ledger";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
const AUDIT_TAG: &str = "reward";

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
    let config = Config {
        wallet_contract: WalletContract(wallet_contract),
        paused: false,
        scoring: msg.scoring.unwrap_or_default(),
    };
    CONFIG.save(deps.storage, &config)?;
    AUTH.initialize(deps.storage, &admin)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", CONTRACT_NAME)
        .add_attribute("admin", admin.as_str())
        .add_attribute("wallet_contract", config.wallet_contract.addr().as_str()))
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
        ExecuteMsg::AwardCredits {
            student,
            quiz_id,
            points,
        } => execute_award_credits(deps, env, info, student, quiz_id, points),
        ExecuteMsg::BatchAwardCredits { awards } => {
            execute_batch_award_credits(deps, env, info, awards)
        }
        ExecuteMsg::SubmitQuizCompletion {
            student,
            quiz_id,
            correct_answers,
            total_questions,
            quiz_reward,
        } => execute_submit_quiz_completion(
            deps,
            env,
            info,
            student,
            quiz_id,
            correct_answers,
            total_questions,
            quiz_reward,
        ),
        ExecuteMsg::ManualAwardTierBonus { student, tier } => {
            execute_manual_award_tier_bonus(deps, env, info, student, tier)
        }
        ExecuteMsg::UpdateWalletContract { wallet_contract } => {
            execute_update_wallet_contract(deps, info, wallet_contract)
        }
        ExecuteMsg::UpdateScoringPolicy { scoring } => {
            execute_update_scoring_policy(deps, info, scoring)
        }
        ExecuteMsg::Pause {} => execute_set_paused(deps, info, true),
        ExecuteMsg::Unpause {} => execute_set_paused(deps, info, false),
        ExecuteMsg::GrantRole { role, account } => execute_grant_role(deps, info, role, account),
        ExecuteMsg::RevokeRole { role, account } => {
            execute_revoke_role(deps, info, role, account)
        }
    }
}

// ─── Awards ─────────────────────────────────────────────────────────────────

/// Outcome of applying one award to storage.
struct AppliedAward {
    result: AwardResult,
    /// Wallet credit for a newly reached tier
    bonus_msg: Option<CosmosMsg>,
}

fn bonus_event(student: &Addr, bonus: &TierBonus) -> Event {
    Event::new("learncredit_tier_bonus")
        .add_attribute("student", student.as_str())
        .add_attribute("tier", bonus.tier.as_str())
        .add_attribute("amount", bonus.amount.to_string())
}

fn replay_result(student: &Addr, quiz_id: u64, prior: QuizCompletion) -> AwardResult {
    AwardResult {
        student: student.clone(),
        quiz_id,
        points_awarded: prior.points,
        total_points: prior.total_points_after,
        tier: prior.tier_after,
        bonus: prior.bonus,
        already_completed: true,
    }
}

/// Record one quiz award. Every check runs before the first write, so an
/// error leaves storage untouched.
fn apply_award(
    storage: &mut dyn Storage,
    env: &Env,
    wallet: &dyn CreditSink,
    student: &Addr,
    quiz_id: u64,
    points: u64,
) -> Result<AppliedAward, ContractError> {
    // a recorded quiz replays whatever points the retry carries
    if let Some(prior) = COMPLETIONS.may_load(storage, (student, quiz_id))? {
        return Ok(AppliedAward {
            result: replay_result(student, quiz_id, prior),
            bonus_msg: None,
        });
    }
    validate_points(points)?;

    let mut rewards = STUDENTS.may_load(storage, student)?.unwrap_or_default();
    let previous_tier = rewards.tier();

    rewards.total_points = rewards
        .total_points
        .checked_add(points)
        .ok_or(ContractError::Overflow)?;
    rewards.quizzes_completed = rewards
        .quizzes_completed
        .checked_add(1)
        .ok_or(ContractError::Overflow)?;
    rewards.last_award_at = Some(env.block.time);
    let new_tier = rewards.tier();

    let bonus = bonus_for(previous_tier, new_tier).filter(|b| !rewards.bonus_paid(b.tier));
    let bonus_msg = match &bonus {
        Some(b) => {
            rewards.mark_bonus_paid(b)?;
            Some(wallet.credit_msg(student, b.amount, &b.reason())?)
        }
        None => None,
    };

    let completion = QuizCompletion {
        points,
        total_points_after: rewards.total_points,
        tier_after: new_tier,
        bonus: bonus.clone(),
        completed_at: env.block.time,
    };
    STUDENTS.save(storage, student, &rewards)?;
    COMPLETIONS.save(storage, (student, quiz_id), &completion)?;

    Ok(AppliedAward {
        result: AwardResult {
            student: student.clone(),
            quiz_id,
            points_awarded: points,
            total_points: rewards.total_points,
            tier: new_tier,
            bonus,
            already_completed: false,
        },
        bonus_msg,
    })
}

fn award_response(
    storage: &mut dyn Storage,
    action: &str,
    applied: AppliedAward,
) -> Result<(Response, AwardResult), ContractError> {
    let AppliedAward { result, bonus_msg } = applied;
    let mut res = audited_response(storage, AUDIT_TAG, action)?
        .add_attribute("student", result.student.as_str())
        .add_attribute("quiz_id", result.quiz_id.to_string())
        .add_attribute("points", result.points_awarded.to_string())
        .add_attribute("total_points", result.total_points.to_string())
        .add_attribute("tier", result.tier.as_str())
        .add_attribute("already_completed", result.already_completed.to_string());
    if let Some(msg) = bonus_msg {
        if let Some(bonus) = &result.bonus {
            res = res.add_event(bonus_event(&result.student, bonus));
        }
        res = res.add_message(msg);
    }
    Ok((res, result))
}

pub fn execute_award_credits(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    student: String,
    quiz_id: u64,
    points: u64,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::AwardCredits, None)?;
    assert_not_paused(deps.storage)?;
    let student = validate_account(deps.api, &student)?;

    let config = CONFIG.load(deps.storage)?;
    let applied = apply_award(
        deps.storage,
        &env,
        &config.wallet_contract,
        &student,
        quiz_id,
        points,
    )?;

    let (res, result) = award_response(deps.storage, "award_credits", applied)?;
    Ok(res.set_data(to_json_binary(&result)?))
}

pub fn execute_batch_award_credits(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    awards: Vec<AwardEntry>,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::AwardCredits, None)?;
    assert_not_paused(deps.storage)?;
    validate_batch_size(awards.len())?;

    let config = CONFIG.load(deps.storage)?;
    let mut outcomes = Vec::with_capacity(awards.len());
    let mut messages = vec![];
    let mut events = vec![];
    let (mut awarded, mut failed) = (0u32, 0u32);

    for entry in awards {
        let applied = validate_account(deps.api, &entry.student).and_then(|student| {
            apply_award(
                deps.storage,
                &env,
                &config.wallet_contract,
                &student,
                entry.quiz_id,
                entry.points,
            )
        });
        match applied {
            Ok(AppliedAward { result, bonus_msg }) => {
                if let (Some(msg), Some(bonus)) = (bonus_msg, &result.bonus) {
                    events.push(bonus_event(&result.student, bonus));
                    messages.push(msg);
                }
                if result.already_completed {
                    outcomes.push(AwardOutcome::AlreadyCompleted { result });
                } else {
                    awarded += 1;
                    outcomes.push(AwardOutcome::Awarded { result });
                }
            }
            Err(err) => {
                failed += 1;
                outcomes.push(AwardOutcome::Failed {
                    student: entry.student,
                    quiz_id: entry.quiz_id,
                    error: err.to_string(),
                });
            }
        }
    }

    let res = audited_response(deps.storage, AUDIT_TAG, "batch_award_credits")?;
    Ok(res
        .add_attribute("entries", outcomes.len().to_string())
        .add_attribute("awarded", awarded.to_string())
        .add_attribute("failed", failed.to_string())
        .add_events(events)
        .add_messages(messages)
        .set_data(to_json_binary(&BatchAwardResponse { outcomes })?))
}

#[allow(clippy::too_many_arguments)]
pub fn execute_submit_quiz_completion(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    student: String,
    quiz_id: u64,
    correct_answers: u32,
    total_questions: u32,
    quiz_reward: u64,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::AwardCredits, None)?;
    assert_not_paused(deps.storage)?;
    let student = validate_account(deps.api, &student)?;

    let score = QuizScore::new(correct_answers, total_questions).map_err(|e| {
        ContractError::InvalidInput {
            reason: e.to_string(),
        }
    })?;
    let config = CONFIG.load(deps.storage)?;
    let points = config.scoring.points(&score, quiz_reward);
    let percentage = score.percentage();

    if points == 0 {
        let res = audited_response(deps.storage, AUDIT_TAG, "submit_quiz_completion")?;
        return Ok(res
            .add_attribute("student", student.as_str())
            .add_attribute("quiz_id", quiz_id.to_string())
            .add_attribute("percentage", percentage.to_string())
            .add_attribute("passed", "false")
            .set_data(to_json_binary(&QuizSubmissionResult {
                percentage,
                passed: false,
                points: 0,
                award: None,
            })?));
    }

    let applied = apply_award(
        deps.storage,
        &env,
        &config.wallet_contract,
        &student,
        quiz_id,
        points,
    )?;
    let (res, result) = award_response(deps.storage, "submit_quiz_completion", applied)?;
    Ok(res
        .add_attribute("percentage", percentage.to_string())
        .add_attribute("passed", "true")
        .set_data(to_json_binary(&QuizSubmissionResult {
            percentage,
            passed: true,
            points: result.points_awarded,
            award: Some(result),
        })?))
}

pub fn execute_manual_award_tier_bonus(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    student: String,
    tier: Tier,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(
        &AUTH,
        deps.storage,
        &info.sender,
        Operation::AwardTierBonus,
        None,
    )?;
    assert_not_paused(deps.storage)?;
    let student = validate_account(deps.api, &student)?;

    let amount = tier.bonus_amount().ok_or_else(|| ContractError::InvalidInput {
        reason: format!("{} tier carries no bonus", tier.as_str()),
    })?;
    let mut rewards = STUDENTS.may_load(deps.storage, &student)?.unwrap_or_default();
    if rewards.tier() < tier {
        return Err(ContractError::InvalidInput {
            reason: format!(
                "student is {} and has not reached {}",
                rewards.tier().as_str(),
                tier.as_str()
            ),
        });
    }

    let granted = !rewards.bonus_paid(tier);
    let mut res = audited_response(deps.storage, AUDIT_TAG, "manual_award_tier_bonus")?
        .add_attribute("student", student.as_str())
        .add_attribute("tier", tier.as_str())
        .add_attribute("granted", granted.to_string())
        .add_attribute("operator", info.sender.as_str());

    if granted {
        let bonus = TierBonus { tier, amount };
        rewards.mark_bonus_paid(&bonus)?;
        rewards.last_award_at = Some(env.block.time);
        STUDENTS.save(deps.storage, &student, &rewards)?;

        let config = CONFIG.load(deps.storage)?;
        res = res
            .add_event(bonus_event(&student, &bonus))
            .add_message(config.wallet_contract.credit_msg(
                &student,
                amount,
                &bonus.reason(),
            )?);
    }

    Ok(res.set_data(to_json_binary(&ManualBonusResult {
        student,
        tier,
        granted,
        amount: if granted { amount } else { Uint128::zero() },
    })?))
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
    config.wallet_contract = WalletContract(wallet_contract);
    CONFIG.save(deps.storage, &config)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "update_wallet_contract")?;
    Ok(res
        .add_attribute("wallet_contract", config.wallet_contract.addr().as_str())
        .add_attribute("operator", info.sender.as_str()))
}

pub fn execute_update_scoring_policy(
    deps: DepsMut,
    info: MessageInfo,
    scoring: ScoringPolicy,
) -> Result<Response, ContractError> {
    reject_funds(&info)?;
    assert_authorized(&AUTH, deps.storage, &info.sender, Operation::UpdateConfig, None)?;

    let policy = match &scoring {
        ScoringPolicy::Proportional => "proportional",
        ScoringPolicy::PerCorrectAnswer { points_per_answer } => {
            if *points_per_answer == 0 {
                return Err(ContractError::InvalidInput {
                    reason: "points per answer must be positive".to_string(),
                });
            }
            "per_correct_answer"
        }
    };

    let mut config = CONFIG.load(deps.storage)?;
    config.scoring = scoring;
    CONFIG.save(deps.storage, &config)?;

    let res = audited_response(deps.storage, AUDIT_TAG, "update_scoring_policy")?;
    Ok(res
        .add_attribute("policy", policy)
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

// ─── Queries ────────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::StudentRewards { student } => query_student_rewards(deps, student),
        QueryMsg::StudentTier { student } => {
            let student = deps.api.addr_validate(&student)?;
            let rewards = STUDENTS.may_load(deps.storage, &student)?.unwrap_or_default();
            to_json_binary(&TierResponse {
                tier: rewards.tier(),
            })
        }
        QueryMsg::QuizCompleted { student, quiz_id } => {
            let student = deps.api.addr_validate(&student)?;
            to_json_binary(&QuizCompletedResponse {
                completed: COMPLETIONS.has(deps.storage, (&student, quiz_id)),
            })
        }
        QueryMsg::QuizCompletion { student, quiz_id } => {
            let student = deps.api.addr_validate(&student)?;
            to_json_binary(&COMPLETIONS.may_load(deps.storage, (&student, quiz_id))?)
        }
        QueryMsg::CompletedQuizzes {
            student,
            start_after,
            limit,
        } => query_completed_quizzes(deps, student, start_after, limit),
        QueryMsg::Thresholds {} => to_json_binary(&ThresholdsResponse {
            silver_threshold: SILVER_THRESHOLD,
            gold_threshold: GOLD_THRESHOLD,
            silver_bonus: SILVER_BONUS.into(),
            gold_bonus: GOLD_BONUS.into(),
        }),
        QueryMsg::HasRole { role, account } => {
            let account = deps.api.addr_validate(&account)?;
            to_json_binary(&HasRoleResponse {
                has_role: AUTH.has_role(deps.storage, role, &account),
            })
        }
    }
}

fn query_student_rewards(deps: Deps, student: String) -> StdResult<Binary> {
    let student = deps.api.addr_validate(&student)?;
    let rewards: StudentRewards = STUDENTS.may_load(deps.storage, &student)?.unwrap_or_default();
    to_json_binary(&StudentRewardsResponse {
        tier: rewards.tier(),
        student,
        total_points: rewards.total_points,
        quizzes_completed: rewards.quizzes_completed,
        total_bonus: rewards.total_bonus,
        silver_bonus_paid: rewards.silver_bonus_paid,
        gold_bonus_paid: rewards.gold_bonus_paid,
    })
}

fn query_completed_quizzes(
    deps: Deps,
    student: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let student = deps.api.addr_validate(&student)?;
    let limit = limit.unwrap_or(30).min(100) as usize;
    let min_bound = start_after.map(Bound::exclusive);

    let quiz_ids = COMPLETIONS
        .prefix(&student)
        .keys(deps.storage, min_bound, None, Order::Ascending)
        .take(limit)
        .collect::<StdResult<Vec<u64>>>()?;

    to_json_binary(&CompletedQuizzesResponse { quiz_ids })
}

// ─── Migrate ────────────────────────────────────────────────────────────────

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
