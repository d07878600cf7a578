//! Protocol module - contract surface and its local execution substrate.
//!
//! This module exposes the deployed contract, the events it emits, and an
//! in-process chain that supplies native balances around it.

pub mod bank;
pub mod chain;
pub mod contract;
pub mod events;

pub use bank::*;
pub use chain::*;
pub use contract::*;
pub use events::*;
