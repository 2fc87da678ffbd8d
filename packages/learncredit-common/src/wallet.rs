use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_binary, Addr, CosmosMsg, StdResult, Uint128, WasmMsg};

/// The slice of the student wallet's execute API that other ledgers call.
/// Serializes exactly like the wallet's own `ExecuteMsg::AddCredits`.
#[cw_serde]
pub enum WalletExecuteMsg {
    AddCredits {
        student: String,
        amount: Uint128,
        reason: String,
    },
}

/// Anything that can turn a credit instruction into a message.
pub trait CreditSink {
    fn credit_msg(&self, student: &Addr, amount: Uint128, reason: &str) -> StdResult<CosmosMsg>;
}

/// Handle to a deployed student wallet contract.
#[cw_serde]
pub struct WalletContract(pub Addr);

impl WalletContract {
    pub fn addr(&self) -> &Addr {
        &self.0
    }
}

impl CreditSink for WalletContract {
    fn credit_msg(&self, student: &Addr, amount: Uint128, reason: &str) -> StdResult<CosmosMsg> {
        let msg = WalletExecuteMsg::AddCredits {
            student: student.to_string(),
            amount,
            reason: reason.to_string(),
        };
        Ok(WasmMsg::Execute {
            contract_addr: self.0.to_string(),
            msg: to_json_binary(&msg)?,
            funds: vec![],
        }
        .into())
    }
}
