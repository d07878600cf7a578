//! Athena Command Line Interface.
//!
//! Drives a [`LocalChain`] persisted in a data directory: each invocation
//! loads the chain, runs one command, and saves the result.

pub mod args;
pub mod commands;
pub mod config;
pub mod output;

pub use args::*;
pub use commands::*;
pub use config::*;
pub use output::*;

use thiserror::Error;

use crate::error::Error;
use crate::protocol::bank::InMemoryBank;
use crate::protocol::chain::LocalChain;
use crate::storage::{FileStore, StateManager};
use crate::utils::crypto::Address;

// ═══════════════════════════════════════════════════════════════════════════════
// CLI APPLICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Application state
#[derive(Debug)]
pub struct CliApp {
    config: CliConfig,
    output: OutputFormatter,
}

impl CliApp {
    /// Create new CLI application
    pub fn new(config: CliConfig) -> Self {
        let output = OutputFormatter::new(config.format);
        Self { config, output }
    }

    /// Override the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self.output = OutputFormatter::new(format);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Get output formatter
    pub fn output(&self) -> &OutputFormatter {
        &self.output
    }

    /// Open the state store in the data directory
    pub fn state(&self) -> CliResult<StateManager<FileStore>> {
        Ok(StateManager::new(FileStore::new(&self.config.data_dir)?))
    }

    /// Load the persisted chain
    pub fn load_chain(&self, state: &StateManager<FileStore>) -> CliResult<LocalChain<InMemoryBank>> {
        state.load_chain()?.ok_or_else(|| {
            CliError::NotFound(format!(
                "no deployment in {}; run `athena init` first",
                self.config.data_dir.display()
            ))
        })
    }

    /// Resolve the acting account: an explicit argument wins over the configured operator
    pub fn operator(&self, explicit: Option<&str>, contract: Address) -> CliResult<Address> {
        match explicit.or(self.config.operator.as_deref()) {
            Some(account) => parse_account(account, contract),
            None => Err(CliError::InvalidArgument(format!(
                "no account given and no operator configured (set --from or {})",
                ENV_OPERATOR
            ))),
        }
    }

    /// Execute a command
    pub fn execute(&self, command: Command) -> CliResult<CommandOutput> {
        tracing::debug!(command = command.name(), "executing");
        command.execute(self)
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new(CliConfig::default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLI RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The contract or chain rejected the operation
    #[error("{0}")]
    Contract(#[from] Error),
    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A deployment already exists
    #[error("Already initialized: {0}")]
    AlreadyExists(String),
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// CLI Result type
pub type CliResult<T> = std::result::Result<T, CliError>;

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Command execution output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Success status
    pub success: bool,
    /// Output message
    pub message: String,
    /// Structured data
    pub data: Option<serde_json::Value>,
    /// Warnings
    pub warnings: Vec<String>,
}

impl CommandOutput {
    /// Create success output
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            warnings: Vec::new(),
        }
    }

    /// Create success with data
    pub fn success_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::success(message)
        }
    }

    /// Add warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_resolution() {
        let contract = Address::from_label("c");
        let mut config = CliConfig::new("/tmp/unused");
        let app = CliApp::new(config.clone());
        assert!(matches!(
            app.operator(None, contract),
            Err(CliError::InvalidArgument(_))
        ));

        config.operator = Some("alice".into());
        let app = CliApp::new(config);
        assert_eq!(app.operator(None, contract).unwrap(), Address::from_label("alice"));
        assert_eq!(app.operator(Some("bob"), contract).unwrap(), Address::from_label("bob"));
    }

    #[test]
    fn test_command_output_with_warning() {
        let output = CommandOutput::success("OK").with_warning("one").with_warning("two");
        assert!(output.success);
        assert_eq!(output.warnings.len(), 2);
    }

    #[test]
    fn test_cli_error_display() {
        let err = CliError::from(Error::ZeroAmount);
        assert_eq!(err.to_string(), Error::ZeroAmount.to_string());
    }
}
