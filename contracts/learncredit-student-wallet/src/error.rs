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

    #[error("wallet is paused")]
    SystemPaused,

    #[error("wallet is not paused")]
    NotPaused,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("no wallet for student {student}")]
    WalletNotFound { student: String },

    #[error("spending category {category} is not enabled for this student")]
    CategoryNotAllowed { category: String },

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: String, available: String },

    #[error("spending request not found: {id}")]
    RequestNotFound { id: u64 },

    #[error("spending request {id} is not pending")]
    NotPending { id: u64 },

    #[error("overflow in arithmetic operation")]
    Overflow,

    #[error("unexpected funds sent with this message")]
    UnexpectedFunds,
}
