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

    #[error("funding pool is paused")]
    SystemPaused,

    #[error("funding pool is not paused")]
    NotPaused,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("insufficient pool balance for {school}: need {needed}, have {available}")]
    InsufficientPoolBalance {
        school: String,
        needed: String,
        available: String,
    },

    #[error("disbursement request {id} not found")]
    RequestNotFound { id: u64 },

    #[error("disbursement request {id} is not pending")]
    NotPending { id: u64 },

    #[error("no disbursement awaiting settlement for reply {id}")]
    UnknownReply { id: u64 },

    #[error("overflow in arithmetic operation")]
    Overflow,

    #[error("unexpected funds sent with this message")]
    UnexpectedFunds,
}
