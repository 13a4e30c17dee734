//! # tradechain-contracts
//!
//! Shared types, verdicts, and error contracts for the TRADECHAIN ledger.
//!
//! Every other crate in the workspace depends on this one. It holds data
//! definitions and error types only.

pub mod action;
pub mod error;
pub mod hash;
pub mod policy;
pub mod request;
pub mod risk;
pub mod subject;
pub mod verdict;
