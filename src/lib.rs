//! # Athena
//!
//! A fixed-supply fungible token that doubles as a wrapper for the native
//! currency of its execution substrate.
//!
//! ## Architecture
//!
//! - **Core**: token ledger, tax policy, exchange engine and fee treasury
//! - **Protocol**: the deployed contract, its events, and an in-process chain
//!   supplying native balances
//! - **Storage**: snapshot persistence for the local chain
//! - **CLI**: operator commands over a persisted local chain
//!
//! Sending native currency to the contract wraps it: the sender receives
//! `value - value / 1000` tokens from the contract's own reserve. Unwrapping
//! returns tokens to the reserve and pays out the same amount minus the same
//! tax. Taxes accumulate as a residue that only the owner can withdraw.
//!
//! ## Example
//!
//! ```rust,ignore
//! use athena::prelude::*;
//!
//! let owner = Address::from_label("owner");
//! let alice = Address::from_label("alice");
//! let bank = InMemoryBank::with_accounts(&[alice], NativeAmount::from_whole(10));
//! let chain = LocalChain::deploy(DeploymentConfig::new(owner), bank)?;
//!
//! let receipt = chain.wrap(alice, NativeAmount::from_whole(5))?;
//! assert_eq!(receipt.credited.to_string(), "4.995");
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cli;
pub mod core;
pub mod error;
pub mod protocol;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        config::{DeploymentConfig, InitialHolder},
        exchange::{ExchangeEngine, UnwrapReceipt, WrapReceipt},
        fees::{TaxCalculation, TaxPolicy},
        token::{Ledger, TokenAmount},
        treasury::{NativeAmount, Treasury},
    };
    pub use crate::error::{Error, Result};
    pub use crate::protocol::{
        bank::{InMemoryBank, NativeBank},
        chain::LocalChain,
        contract::AthenaWrap,
        events::{ContractEvent, EventKind},
    };
    pub use crate::utils::crypto::{Address, Hash};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
