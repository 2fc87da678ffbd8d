use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{coin, from_json, Addr, MemoryStorage, OwnedDeps, Uint128};
use learncredit_common::access::Role;

use learncredit_student_wallet::contract::{execute, instantiate, query};
use learncredit_student_wallet::error::ContractError;
use learncredit_student_wallet::msg::*;
use learncredit_student_wallet::state::{SpendingCategory, SpendingStatus};

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

fn a(deps: &TestDeps, name: &str) -> Addr {
    deps.api.addr_make(name)
}

fn exec(deps: &mut TestDeps, sender: &Addr, msg: ExecuteMsg) -> Result<cosmwasm_std::Response, ContractError> {
    execute(deps.as_mut(), mock_env(), message_info(sender, &[]), msg)
}

/// Admin, a credit issuer and a guardian assigned to "student".
fn setup() -> TestDeps {
    let mut deps = mock_dependencies();
    let admin = a(&deps, "admin");
    let issuer = a(&deps, "issuer");
    let guardian = a(&deps, "guardian");
    let student = a(&deps, "student");

    let msg = InstantiateMsg {
        admin: admin.to_string(),
    };
    instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();

    exec(
        &mut deps,
        &admin,
        ExecuteMsg::GrantRole {
            role: Role::CreditIssuer,
            account: issuer.to_string(),
        },
    )
    .unwrap();
    exec(
        &mut deps,
        &admin,
        ExecuteMsg::GrantRole {
            role: Role::Guardian,
            account: guardian.to_string(),
        },
    )
    .unwrap();
    exec(
        &mut deps,
        &admin,
        ExecuteMsg::AssignGuardian {
            guardian: guardian.to_string(),
            student: student.to_string(),
        },
    )
    .unwrap();
    deps
}

fn credit(deps: &mut TestDeps, student: &Addr, amount: u128) {
    let issuer = a(deps, "issuer");
    exec(
        deps,
        &issuer,
        ExecuteMsg::AddCredits {
            student: student.to_string(),
            amount: Uint128::new(amount),
            reason: "test".to_string(),
        },
    )
    .unwrap();
}

fn allow(deps: &mut TestDeps, student: &Addr, category: SpendingCategory) {
    let guardian = a(deps, "guardian");
    exec(
        deps,
        &guardian,
        ExecuteMsg::UpdateAllowedCategory {
            student: student.to_string(),
            category,
            allowed: true,
        },
    )
    .unwrap();
}

fn request(deps: &mut TestDeps, student: &Addr, amount: u128) -> u64 {
    let res = exec(
        deps,
        student,
        ExecuteMsg::RequestSpending {
            amount: Uint128::new(amount),
            category: SpendingCategory::Books,
            merchant: "bookshop".to_string(),
        },
    )
    .unwrap();
    let created: SpendingRequestCreated = from_json(res.data.unwrap()).unwrap();
    created.request_id
}

fn wallet_info(deps: &TestDeps, student: &Addr) -> WalletInfoResponse {
    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::WalletInfo {
            student: student.to_string(),
        },
    )
    .unwrap();
    from_json(res).unwrap()
}

fn assert_balanced(info: &WalletInfoResponse) {
    assert_eq!(info.total_earned - info.total_spent, info.balance);
}

// ─── Wallet lifecycle ───────────────────────────────────────────────────────

#[test]
fn test_create_wallet_is_idempotent() {
    let mut deps = setup();
    let student = a(&deps, "student");

    let res = exec(
        &mut deps,
        &student,
        ExecuteMsg::CreateWallet {
            student: student.to_string(),
        },
    )
    .unwrap();
    let created: WalletCreated = from_json(res.data.unwrap()).unwrap();
    assert!(created.created);

    let res = exec(
        &mut deps,
        &student,
        ExecuteMsg::CreateWallet {
            student: student.to_string(),
        },
    )
    .unwrap();
    let created: WalletCreated = from_json(res.data.unwrap()).unwrap();
    assert!(!created.created);

    let info = wallet_info(&deps, &student);
    assert!(info.exists);
    assert_eq!(info.balance, Uint128::zero());
}

#[test]
fn test_create_wallet_for_someone_else_requires_capability() {
    let mut deps = setup();
    let stranger = a(&deps, "stranger");
    let other = a(&deps, "other_student");

    let err = exec(
        &mut deps,
        &stranger,
        ExecuteMsg::CreateWallet {
            student: other.to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    let admin = a(&deps, "admin");
    exec(
        &mut deps,
        &admin,
        ExecuteMsg::CreateWallet {
            student: other.to_string(),
        },
    )
    .unwrap();
    assert!(wallet_info(&deps, &other).exists);
}

#[test]
fn test_create_wallet_empty_student_fails() {
    let mut deps = setup();
    let admin = a(&deps, "admin");
    let err = exec(
        &mut deps,
        &admin,
        ExecuteMsg::CreateWallet {
            student: "".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidInput { .. }));
}

// ─── Credits ────────────────────────────────────────────────────────────────

#[test]
fn test_add_credits_by_issuer() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let issuer = a(&deps, "issuer");

    let res = exec(
        &mut deps,
        &issuer,
        ExecuteMsg::AddCredits {
            student: student.to_string(),
            amount: Uint128::new(1000),
            reason: "tier_bonus:silver".to_string(),
        },
    )
    .unwrap();
    assert_eq!(res.attributes[0].value, "add_credits");
    assert_eq!(res.attributes[1].key, "audit_ref");

    let info = wallet_info(&deps, &student);
    // wallet opened implicitly
    assert!(info.exists);
    assert_eq!(info.balance, Uint128::new(1000));
    assert_eq!(info.total_earned, Uint128::new(1000));
    assert_balanced(&info);
}

#[test]
fn test_add_credits_rejects_people() {
    let mut deps = setup();
    let student = a(&deps, "student");

    for sender in ["admin", "guardian", "student"] {
        let sender = a(&deps, sender);
        let err = exec(
            &mut deps,
            &sender,
            ExecuteMsg::AddCredits {
                student: student.to_string(),
                amount: Uint128::new(1000),
                reason: "self-service".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized { .. }));
    }
    assert_eq!(wallet_info(&deps, &student).balance, Uint128::zero());
}

#[test]
fn test_add_zero_credits_fails() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let issuer = a(&deps, "issuer");
    let err = exec(
        &mut deps,
        &issuer,
        ExecuteMsg::AddCredits {
            student: student.to_string(),
            amount: Uint128::zero(),
            reason: "nothing".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidInput { .. }));
}

// ─── Spending requests ──────────────────────────────────────────────────────

#[test]
fn test_request_spending_happy_path() {
    let mut deps = setup();
    let student = a(&deps, "student");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);

    let id = request(&mut deps, &student, 300);
    assert_eq!(id, 1);

    // nothing debited yet
    assert_eq!(wallet_info(&deps, &student).balance, Uint128::new(1000));

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::SpendingRequest { request_id: id },
    )
    .unwrap();
    let resp: SpendingRequestResponse = from_json(res).unwrap();
    assert_eq!(resp.request.status, SpendingStatus::Pending);
    assert_eq!(resp.request.merchant, "bookshop");

    let res = query(deps.as_ref(), mock_env(), QueryMsg::NextRequestId {}).unwrap();
    let next: NextRequestIdResponse = from_json(res).unwrap();
    assert_eq!(next.next_request_id, 2);
}

#[test]
fn test_request_spending_category_default_deny() {
    let mut deps = setup();
    let student = a(&deps, "student");
    credit(&mut deps, &student, 1000);

    let err = exec(
        &mut deps,
        &student,
        ExecuteMsg::RequestSpending {
            amount: Uint128::new(100),
            category: SpendingCategory::Entertainment,
            merchant: "cinema".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::CategoryNotAllowed {
            category: "entertainment".to_string()
        }
    );
}

#[test]
fn test_request_spending_over_balance_fails() {
    let mut deps = setup();
    let student = a(&deps, "student");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);

    let err = exec(
        &mut deps,
        &student,
        ExecuteMsg::RequestSpending {
            amount: Uint128::new(1001),
            category: SpendingCategory::Books,
            merchant: "bookshop".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InsufficientBalance { .. }));

    let info = wallet_info(&deps, &student);
    assert_eq!(info.balance, Uint128::new(1000));
    assert_balanced(&info);
}

#[test]
fn test_request_spending_invalid_input() {
    let mut deps = setup();
    let student = a(&deps, "student");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);

    let err = exec(
        &mut deps,
        &student,
        ExecuteMsg::RequestSpending {
            amount: Uint128::zero(),
            category: SpendingCategory::Books,
            merchant: "bookshop".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidInput { .. }));

    let err = exec(
        &mut deps,
        &student,
        ExecuteMsg::RequestSpending {
            amount: Uint128::new(10),
            category: SpendingCategory::Books,
            merchant: "   ".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidInput { .. }));
}

#[test]
fn test_request_spending_without_wallet_fails() {
    let mut deps = setup();
    let nobody = a(&deps, "nobody");
    let err = exec(
        &mut deps,
        &nobody,
        ExecuteMsg::RequestSpending {
            amount: Uint128::new(10),
            category: SpendingCategory::Food,
            merchant: "canteen".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::WalletNotFound { .. }));
}

#[test]
fn test_guardian_approves_spending() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let guardian = a(&deps, "guardian");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);
    let id = request(&mut deps, &student, 300);

    let res = exec(
        &mut deps,
        &guardian,
        ExecuteMsg::ApproveSpending { request_id: id },
    )
    .unwrap();
    let resolved: SpendingResolved = from_json(res.data.unwrap()).unwrap();
    assert_eq!(resolved.status, SpendingStatus::Approved);
    assert_eq!(resolved.balance, Uint128::new(700));

    let info = wallet_info(&deps, &student);
    assert_eq!(info.balance, Uint128::new(700));
    assert_eq!(info.total_spent, Uint128::new(300));
    assert_balanced(&info);

    // terminal: a second approval is a conflict and debits nothing
    let err = exec(
        &mut deps,
        &guardian,
        ExecuteMsg::ApproveSpending { request_id: id },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::NotPending { id });
    assert_eq!(wallet_info(&deps, &student).balance, Uint128::new(700));
}

#[test]
fn test_unrelated_guardian_cannot_approve() {
    let mut deps = setup();
    let admin = a(&deps, "admin");
    let student = a(&deps, "student");
    let other_guardian = a(&deps, "other_guardian");
    exec(
        &mut deps,
        &admin,
        ExecuteMsg::GrantRole {
            role: Role::Guardian,
            account: other_guardian.to_string(),
        },
    )
    .unwrap();

    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);
    let id = request(&mut deps, &student, 300);

    let err = exec(
        &mut deps,
        &other_guardian,
        ExecuteMsg::ApproveSpending { request_id: id },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    // the student cannot approve their own request either
    let err = exec(
        &mut deps,
        &student,
        ExecuteMsg::ApproveSpending { request_id: id },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
}

#[test]
fn test_approval_revalidates_stale_balance() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let admin = a(&deps, "admin");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);

    let first = request(&mut deps, &student, 700);
    let second = request(&mut deps, &student, 600);

    exec(
        &mut deps,
        &admin,
        ExecuteMsg::ApproveSpending { request_id: first },
    )
    .unwrap();

    let err = exec(
        &mut deps,
        &admin,
        ExecuteMsg::ApproveSpending { request_id: second },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::InsufficientBalance {
            needed: "600".to_string(),
            available: "300".to_string(),
        }
    );

    let info = wallet_info(&deps, &student);
    assert_eq!(info.balance, Uint128::new(300));
    assert_balanced(&info);

    // still pending, so it can be rejected
    exec(
        &mut deps,
        &admin,
        ExecuteMsg::RejectSpending { request_id: second },
    )
    .unwrap();
}

#[test]
fn test_reject_spending_leaves_balance() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let guardian = a(&deps, "guardian");
    credit(&mut deps, &student, 500);
    allow(&mut deps, &student, SpendingCategory::Books);
    let id = request(&mut deps, &student, 200);

    exec(
        &mut deps,
        &guardian,
        ExecuteMsg::RejectSpending { request_id: id },
    )
    .unwrap();
    assert_eq!(wallet_info(&deps, &student).balance, Uint128::new(500));

    let err = exec(
        &mut deps,
        &guardian,
        ExecuteMsg::ApproveSpending { request_id: id },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::NotPending { id });

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::PendingRequests {
            start_after: None,
            limit: None,
        },
    )
    .unwrap();
    let pending: SpendingRequestsResponse = from_json(res).unwrap();
    assert!(pending.requests.is_empty());
}

#[test]
fn test_approve_unknown_request() {
    let mut deps = setup();
    let admin = a(&deps, "admin");
    let err = exec(
        &mut deps,
        &admin,
        ExecuteMsg::ApproveSpending { request_id: 42 },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::RequestNotFound { id: 42 });
}

#[test]
fn test_category_toggle() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let guardian = a(&deps, "guardian");
    allow(&mut deps, &student, SpendingCategory::Food);
    allow(&mut deps, &student, SpendingCategory::Books);

    exec(
        &mut deps,
        &guardian,
        ExecuteMsg::UpdateAllowedCategory {
            student: student.to_string(),
            category: SpendingCategory::Food,
            allowed: false,
        },
    )
    .unwrap();

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::AllowedCategories {
            student: student.to_string(),
        },
    )
    .unwrap();
    let resp: AllowedCategoriesResponse = from_json(res).unwrap();
    assert_eq!(resp.categories, vec![SpendingCategory::Books]);

    let stranger = a(&deps, "stranger");
    let err = exec(
        &mut deps,
        &stranger,
        ExecuteMsg::UpdateAllowedCategory {
            student: student.to_string(),
            category: SpendingCategory::Food,
            allowed: true,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
}

#[test]
fn test_student_requests_listing() {
    let mut deps = setup();
    let student = a(&deps, "student");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);
    for _ in 0..3 {
        request(&mut deps, &student, 10);
    }

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::StudentRequests {
            student: student.to_string(),
            start_after: Some(1),
            limit: Some(10),
        },
    )
    .unwrap();
    let resp: SpendingRequestsResponse = from_json(res).unwrap();
    let ids: Vec<u64> = resp.requests.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

// ─── Emergency withdraw ─────────────────────────────────────────────────────

#[test]
fn test_emergency_withdraw() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let admin = a(&deps, "admin");
    credit(&mut deps, &student, 1000);

    let res = exec(
        &mut deps,
        &admin,
        ExecuteMsg::EmergencyWithdraw {
            student: student.to_string(),
            amount: Uint128::new(400),
        },
    )
    .unwrap();
    assert_eq!(res.attributes[0].value, "emergency_withdraw");
    assert_eq!(res.events[0].ty, "learncredit_emergency");

    let info = wallet_info(&deps, &student);
    assert_eq!(info.balance, Uint128::new(600));
    assert_balanced(&info);

    let err = exec(
        &mut deps,
        &admin,
        ExecuteMsg::EmergencyWithdraw {
            student: student.to_string(),
            amount: Uint128::new(601),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InsufficientBalance { .. }));
}

#[test]
fn test_emergency_withdraw_admin_only() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let guardian = a(&deps, "guardian");
    credit(&mut deps, &student, 1000);

    let err = exec(
        &mut deps,
        &guardian,
        ExecuteMsg::EmergencyWithdraw {
            student: student.to_string(),
            amount: Uint128::new(1),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::Unauthorized {
            role: "admin".to_string()
        }
    );
}

// ─── Pause ──────────────────────────────────────────────────────────────────

#[test]
fn test_pause_blocks_spending_but_not_credits() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let admin = a(&deps, "admin");
    credit(&mut deps, &student, 1000);
    allow(&mut deps, &student, SpendingCategory::Books);
    let id = request(&mut deps, &student, 100);

    exec(&mut deps, &admin, ExecuteMsg::Pause {}).unwrap();

    let err = exec(
        &mut deps,
        &student,
        ExecuteMsg::RequestSpending {
            amount: Uint128::new(10),
            category: SpendingCategory::Books,
            merchant: "bookshop".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::SystemPaused);

    let err = exec(
        &mut deps,
        &admin,
        ExecuteMsg::ApproveSpending { request_id: id },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::SystemPaused);

    credit(&mut deps, &student, 50);
    assert_eq!(wallet_info(&deps, &student).balance, Uint128::new(1050));

    exec(&mut deps, &admin, ExecuteMsg::Unpause {}).unwrap();
    let err = exec(&mut deps, &admin, ExecuteMsg::Unpause {}).unwrap_err();
    assert_eq!(err, ContractError::NotPaused);
}

#[test]
fn test_pause_requires_admin() {
    let mut deps = setup();
    let guardian = a(&deps, "guardian");
    let err = exec(&mut deps, &guardian, ExecuteMsg::Pause {}).unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
}

// ─── Roles ──────────────────────────────────────────────────────────────────

#[test]
fn test_role_changes_are_audited() {
    let mut deps = setup();
    let admin = a(&deps, "admin");
    let account = a(&deps, "new_admin");

    let res = exec(
        &mut deps,
        &admin,
        ExecuteMsg::GrantRole {
            role: Role::Admin,
            account: account.to_string(),
        },
    )
    .unwrap();
    let event = &res.events[0];
    assert_eq!(event.ty, "learncredit_role");
    let attr = |key: &str| {
        event
            .attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.clone())
            .unwrap()
    };
    assert_eq!(attr("operator"), admin.to_string());
    assert_eq!(attr("role"), "admin");
    assert_eq!(attr("account"), account.to_string());
    assert_eq!(attr("change"), "grant");

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::HasRole {
            role: Role::Admin,
            account: account.to_string(),
        },
    )
    .unwrap();
    let resp: HasRoleResponse = from_json(res).unwrap();
    assert!(resp.has_role);
}

#[test]
fn test_non_admin_cannot_grant_roles() {
    let mut deps = setup();
    let guardian = a(&deps, "guardian");
    let err = exec(
        &mut deps,
        &guardian,
        ExecuteMsg::GrantRole {
            role: Role::Admin,
            account: guardian.to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
}

#[test]
fn test_last_admin_cannot_be_revoked() {
    let mut deps = setup();
    let admin = a(&deps, "admin");
    let err = exec(
        &mut deps,
        &admin,
        ExecuteMsg::RevokeRole {
            role: Role::Admin,
            account: admin.to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Access(_)));
}

#[test]
fn test_removed_guardian_loses_scope() {
    let mut deps = setup();
    let admin = a(&deps, "admin");
    let guardian = a(&deps, "guardian");
    let student = a(&deps, "student");

    exec(
        &mut deps,
        &admin,
        ExecuteMsg::RemoveGuardian {
            guardian: guardian.to_string(),
            student: student.to_string(),
        },
    )
    .unwrap();

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::IsGuardian {
            guardian: guardian.to_string(),
            student: student.to_string(),
        },
    )
    .unwrap();
    let resp: IsGuardianResponse = from_json(res).unwrap();
    assert!(!resp.is_guardian);
}

#[test]
fn test_funds_are_rejected() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let err = execute(
        deps.as_mut(),
        mock_env(),
        message_info(&student, &[coin(10, "uatom")]),
        ExecuteMsg::CreateWallet {
            student: student.to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::UnexpectedFunds);
}

#[test]
fn test_ledger_invariant_over_sequence() {
    let mut deps = setup();
    let student = a(&deps, "student");
    let admin = a(&deps, "admin");
    allow(&mut deps, &student, SpendingCategory::Books);

    credit(&mut deps, &student, 1000);
    let r1 = request(&mut deps, &student, 250);
    credit(&mut deps, &student, 2000);
    let r2 = request(&mut deps, &student, 1500);
    exec(&mut deps, &admin, ExecuteMsg::ApproveSpending { request_id: r1 }).unwrap();
    exec(&mut deps, &admin, ExecuteMsg::RejectSpending { request_id: r2 }).unwrap();
    exec(
        &mut deps,
        &admin,
        ExecuteMsg::EmergencyWithdraw {
            student: student.to_string(),
            amount: Uint128::new(50),
        },
    )
    .unwrap();

    let info = wallet_info(&deps, &student);
    assert_eq!(info.total_earned, Uint128::new(3000));
    assert_eq!(info.total_spent, Uint128::new(300));
    assert_eq!(info.balance, Uint128::new(2700));
    assert_balanced(&info);
}
