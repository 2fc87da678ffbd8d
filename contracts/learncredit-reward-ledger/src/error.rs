use cosmwasm_std::StdError;
use learncredit_common::access::AccessError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Access(#[from] AccessError),

    #[error("unauthorized: only {role} can perform this action")]
    Unauthorized { role: String },

    #[error("reward ledger is paused")]
    SystemPaused,

    #[error("reward ledger is not paused")]
    NotPaused,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("overflow in arithmetic operation")]
    Overflow,

    #[error("unexpected funds sent with this message")]
    UnexpectedFunds,
}
