//! Funding pool settling disbursements against a deployed student wallet.

use cosmwasm_std::{Addr, Empty, Uint128};
use cw_multi_test::{App, Contract, ContractWrapper, Executor};
use learncredit_common::access::Role;

use learncredit_funding_pool::msg as pool;
use learncredit_funding_pool::state::{DisbursementStatus, PoolStats};
use learncredit_student_wallet::msg as wallet;

const SCHOOL: &str = "north-high";

fn pool_contract() -> Box<dyn Contract<Empty>> {
    Box::new(
        ContractWrapper::new(
            learncredit_funding_pool::contract::execute,
            learncredit_funding_pool::contract::instantiate,
            learncredit_funding_pool::contract::query,
        )
        .with_reply(learncredit_funding_pool::contract::reply),
    )
}

fn wallet_contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(
        learncredit_student_wallet::contract::execute,
        learncredit_student_wallet::contract::instantiate,
        learncredit_student_wallet::contract::query,
    ))
}

struct Suite {
    app: App,
    admin: Addr,
    student: Addr,
    wallet: Addr,
    pool: Addr,
}

/// Pool funded with 5000 for SCHOOL and one pending 3000 request.
fn suite(grant_issuer: bool) -> (Suite, u64) {
    let mut app = App::default();
    let admin = app.api().addr_make("admin");
    let donor = app.api().addr_make("donor");
    let student = app.api().addr_make("student");

    let wallet_code = app.store_code(wallet_contract());
    let wallet = app
        .instantiate_contract(
            wallet_code,
            admin.clone(),
            &wallet::InstantiateMsg {
                admin: admin.to_string(),
            },
            &[],
            "wallet",
            None,
        )
        .unwrap();

    let pool_code = app.store_code(pool_contract());
    let pool = app
        .instantiate_contract(
            pool_code,
            admin.clone(),
            &pool::InstantiateMsg {
                admin: admin.to_string(),
                wallet_contract: wallet.to_string(),
            },
            &[],
            "funding-pool",
            None,
        )
        .unwrap();

    if grant_issuer {
        app.execute_contract(
            admin.clone(),
            wallet.clone(),
            &wallet::ExecuteMsg::GrantRole {
                role: Role::CreditIssuer,
                account: pool.to_string(),
            },
            &[],
        )
        .unwrap();
    }

    app.execute_contract(
        donor,
        pool.clone(),
        &pool::ExecuteMsg::Donate {
            school: SCHOOL.to_string(),
            amount: Uint128::new(5000),
        },
        &[],
    )
    .unwrap();
    app.execute_contract(
        student.clone(),
        pool.clone(),
        &pool::ExecuteMsg::RequestDisbursement {
            school: SCHOOL.to_string(),
            amount: Uint128::new(3000),
            student: None,
        },
        &[],
    )
    .unwrap();

    let suite = Suite {
        app,
        admin,
        student,
        wallet,
        pool,
    };
    (suite, 1)
}

impl Suite {
    fn pool_balance(&self) -> Uint128 {
        let res: pool::PoolBalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.pool,
                &pool::QueryMsg::PoolBalance {
                    school: SCHOOL.to_string(),
                },
            )
            .unwrap();
        res.balance
    }

    fn stats(&self) -> PoolStats {
        self.app
            .wrap()
            .query_wasm_smart(&self.pool, &pool::QueryMsg::PoolStats {})
            .unwrap()
    }

    fn status(&self, request_id: u64) -> DisbursementStatus {
        let res: pool::RequestResponse = self
            .app
            .wrap()
            .query_wasm_smart(&self.pool, &pool::QueryMsg::Request { request_id })
            .unwrap();
        res.request.status
    }

    fn wallet_balance(&self) -> Uint128 {
        let res: wallet::BalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.wallet,
                &wallet::QueryMsg::Balance {
                    student: self.student.to_string(),
                },
            )
            .unwrap();
        res.balance
    }
}

#[test]
fn test_approved_disbursement_completes_in_the_wallet() {
    let (mut suite, id) = suite(true);

    suite
        .app
        .execute_contract(
            suite.admin.clone(),
            suite.pool.clone(),
            &pool::ExecuteMsg::ApproveDisbursement { request_id: id },
            &[],
        )
        .unwrap();

    assert_eq!(suite.pool_balance(), Uint128::new(2000));
    assert_eq!(suite.wallet_balance(), Uint128::new(3000));
    assert_eq!(suite.status(id), DisbursementStatus::Completed);

    let err = suite
        .app
        .execute_contract(
            suite.admin.clone(),
            suite.pool.clone(),
            &pool::ExecuteMsg::ApproveDisbursement { request_id: id },
            &[],
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("not pending"));
    assert_eq!(suite.wallet_balance(), Uint128::new(3000));
}

#[test]
fn test_failed_wallet_credit_leaves_pool_and_request_untouched() {
    // pool was never made a credit issuer, so the wallet refuses
    let (mut suite, id) = suite(false);
    let before = suite.stats();

    let res = suite.app.execute_contract(
        suite.admin.clone(),
        suite.pool.clone(),
        &pool::ExecuteMsg::ApproveDisbursement { request_id: id },
        &[],
    );
    assert!(res.is_err());

    assert_eq!(suite.pool_balance(), Uint128::new(5000));
    assert_eq!(suite.status(id), DisbursementStatus::Pending);
    assert_eq!(suite.stats(), before);
    assert_eq!(suite.wallet_balance(), Uint128::zero());

    // once the role is in place the same request goes through
    suite
        .app
        .execute_contract(
            suite.admin.clone(),
            suite.wallet.clone(),
            &wallet::ExecuteMsg::GrantRole {
                role: Role::CreditIssuer,
                account: suite.pool.to_string(),
            },
            &[],
        )
        .unwrap();
    suite
        .app
        .execute_contract(
            suite.admin.clone(),
            suite.pool.clone(),
            &pool::ExecuteMsg::ApproveDisbursement { request_id: id },
            &[],
        )
        .unwrap();
    assert_eq!(suite.status(id), DisbursementStatus::Completed);
    assert_eq!(suite.wallet_balance(), Uint128::new(3000));
}
