//! Core modules for the Athena ledger.
//!
//! This module contains the fundamental building blocks:
//! - Deployment configuration
//! - Token ledger (balances, transfers, allowances)
//! - Flat-rate tax policy
//! - Native currency treasury
//! - Wrap/unwrap exchange engine

pub mod config;
pub mod exchange;
pub mod fees;
pub mod token;
pub mod treasury;

pub use config::*;
pub use exchange::*;
pub use fees::*;
pub use token::*;
pub use treasury::*;
