//! CLI Configuration.
//!
//! Settings live in `config.json` inside the data directory; environment
//! variables override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::output::OutputFormat;

/// Environment variable naming the data directory
pub const ENV_DATA_DIR: &str = "ATHENA_DATA_DIR";
/// Environment variable selecting the output format
pub const ENV_FORMAT: &str = "ATHENA_FORMAT";
/// Environment variable naming the default operator account
pub const ENV_OPERATOR: &str = "ATHENA_OPERATOR";

// ═══════════════════════════════════════════════════════════════════════════════
// CLI CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding the persisted chain and this file
    pub data_dir: PathBuf,
    /// Output format
    pub format: OutputFormat,
    /// Account used when a command does not name one
    pub operator: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            format: OutputFormat::Text,
            operator: None,
        }
    }
}

impl CliConfig {
    /// Configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save to file, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Resolve the effective configuration for `data_dir`: the file in that
    /// directory if present, then environment overrides
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }

        let path = Self::path_in(&config.data_dir);
        if path.exists() {
            let stored = Self::load(&path)?;
            config.format = stored.format;
            config.operator = stored.operator;
            config = config.with_env_overrides()?;
        }
        Ok(config)
    }

    /// Apply `ATHENA_*` variables on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(format) = std::env::var(ENV_FORMAT) {
            self.format = format.parse().map_err(ConfigError::Validation)?;
        }
        if let Ok(operator) = std::env::var(ENV_OPERATOR) {
            self.operator = Some(operator);
        }
        Ok(self)
    }

    /// Config file inside `data_dir`
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("config.json")
    }

    /// Config file for this configuration
    pub fn path(&self) -> PathBuf {
        Self::path_in(&self.data_dir)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("data directory cannot be empty".into()));
        }
        if matches!(&self.operator, Some(op) if op.trim().is_empty()) {
            return Err(ConfigError::Validation("operator cannot be blank".into()));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

fn default_data_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".athena"),
        Err(_) => PathBuf::from(".athena"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CliConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
        assert!(config.operator.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_operator_rejected() {
        let mut config = CliConfig::new("/tmp/athena");
        config.operator = Some("  ".into());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CliConfig::new(dir.path());
        config.format = OutputFormat::Json;
        config.operator = Some("alice".into());

        config.save(&config.path()).unwrap();
        let loaded = CliConfig::load(&config.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: CliConfig = serde_json::from_str(r#"{"operator":"bob"}"#).unwrap();
        assert_eq!(config.operator.as_deref(), Some("bob"));
        assert_eq!(config.format, OutputFormat::Text);
    }
}
