//! Shared building blocks for the LearnCredit contracts.
//!
//! Every contract keeps its own copy of the role tables in its own storage;
//! this crate only provides the types, the storage layout and the checks so
//! the reward ledger, student wallet and funding pool gate their privileged
//! transitions the same way.

pub mod access;
pub mod audit;
pub mod scoring;
pub mod wallet;
