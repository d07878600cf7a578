//! Deployment configuration.
//!
//! Everything here is fixed once a contract is deployed: token metadata, the
//! supply, the tax rate, who receives the initial supply and who owns the fees.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::constants::*;
use crate::utils::crypto::Address;
use crate::utils::validation::{validate_address, validate_label};

// ═══════════════════════════════════════════════════════════════════════════════
// INITIAL HOLDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Who receives the full supply at deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialHolder {
    /// The contract's own address; the supply doubles as the wrap reserve
    #[default]
    Contract,
    /// An explicit account; the wrap reserve starts empty
    Account(Address),
}

impl InitialHolder {
    /// Resolve to a concrete address given the contract's own address
    pub fn resolve(&self, contract: Address) -> Address {
        match self {
            InitialHolder::Contract => contract,
            InitialHolder::Account(address) => *address,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEPLOYMENT CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters of a single deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Total supply in base units
    pub total_supply: u128,
    /// Tax divisor (tax = gross / divisor)
    pub tax_divisor: u128,
    /// Recipient of the initial supply
    pub initial_holder: InitialHolder,
    /// Deploying account; the only identity allowed to withdraw fees
    pub owner: Address,
    /// Address the contract is deployed at
    pub contract_address: Address,
    /// Maximum number of events kept in memory
    pub event_capacity: usize,
}

impl DeploymentConfig {
    /// Default deployment by `owner` with the supply held by the contract
    pub fn new(owner: Address) -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            total_supply: TOTAL_SUPPLY,
            tax_divisor: TAX_DIVISOR,
            initial_holder: InitialHolder::Contract,
            owner,
            contract_address: Address::CONTRACT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Assign the initial supply to an explicit account
    pub fn with_initial_holder(mut self, holder: Address) -> Self {
        self.initial_holder = InitialHolder::Account(holder);
        self
    }

    /// Override the tax divisor
    pub fn with_tax_divisor(mut self, divisor: u128) -> Self {
        self.tax_divisor = divisor;
        self
    }

    /// Override the total supply
    pub fn with_total_supply(mut self, supply: u128) -> Self {
        self.total_supply = supply;
        self
    }

    /// Override the event log capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Address receiving the initial supply
    pub fn initial_holder_address(&self) -> Address {
        self.initial_holder.resolve(self.contract_address)
    }

    /// Validate parameters are consistent
    pub fn validate(&self) -> Result<()> {
        validate_label(&self.name, "name")?;
        validate_label(&self.symbol, "symbol")?;
        validate_address(&self.owner)?;
        validate_address(&self.contract_address)?;
        validate_address(&self.initial_holder_address())?;

        if self.total_supply == 0 {
            return Err(Error::InvalidParameter {
                name: "total_supply".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.tax_divisor == 0 {
            return Err(Error::InvalidParameter {
                name: "tax_divisor".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidParameter {
                name: "event_capacity".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Storage(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| Error::Deserialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| Error::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DeploymentConfig::new(owner());
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_holder_address(), Address::CONTRACT);
        assert_eq!(config.total_supply, TOTAL_SUPPLY);
    }

    #[test]
    fn test_explicit_holder() {
        let holder = Address::from_label("treasury-multisig");
        let config = DeploymentConfig::new(owner()).with_initial_holder(holder);
        assert_eq!(config.initial_holder_address(), holder);
    }

    #[test]
    fn test_validation_failures() {
        assert_eq!(
            DeploymentConfig::new(Address::ZERO).validate(),
            Err(Error::InvalidAddress)
        );
        assert_eq!(
            DeploymentConfig::new(owner())
                .with_initial_holder(Address::ZERO)
                .validate(),
            Err(Error::InvalidAddress)
        );
        assert!(DeploymentConfig::new(owner()).with_tax_divisor(0).validate().is_err());
        assert!(DeploymentConfig::new(owner()).with_total_supply(0).validate().is_err());
        assert!(DeploymentConfig::new(owner()).with_event_capacity(0).validate().is_err());
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.json");

        let config = DeploymentConfig::new(owner()).with_initial_holder(Address::from_label("h"));
        config.save(&path).unwrap();

        let loaded = DeploymentConfig::load(&path).unwrap();
        assert_eq!(loaded.initial_holder, config.initial_holder);
        assert_eq!(loaded.owner, config.owner);
        assert_eq!(loaded.total_supply, TOTAL_SUPPLY);
    }
}
