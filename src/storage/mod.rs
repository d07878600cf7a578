//! Storage module for persisting the local chain between CLI invocations.
//!
//! ## Backends
//!
//! - **InMemoryStore**: ephemeral storage for tests
//! - **FileStore**: JSON file in the data directory
//!
//! ## Usage
//!
//! ```rust,ignore
//! use athena::storage::{FileStore, StateManager};
//!
//! let manager = StateManager::new(FileStore::new("./athena-data")?);
//! if let Some(chain) = manager.load_chain()? {
//!     println!("{}", chain.contract().total_supply());
//! }
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
