//! Input validation utilities.
//!
//! Validation runs before any state is touched so that a rejected operation
//! leaves no partial effect.

use crate::error::{Error, Result};
use crate::utils::crypto::Address;

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that an amount is non-zero
pub fn validate_non_zero(amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(Error::ZeroAmount);
    }
    Ok(())
}

/// Validate that a debit of `required` fits in `available`
pub fn validate_sufficient(required: u128, available: u128) -> Result<()> {
    if required > available {
        return Err(Error::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Reject the null identity
pub fn validate_address(address: &Address) -> Result<()> {
    if address.is_zero() {
        return Err(Error::InvalidAddress);
    }
    Ok(())
}

/// Validate a human-readable token name or symbol
pub fn validate_label(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_zero() {
        assert_eq!(validate_non_zero(0), Err(Error::ZeroAmount));
        assert!(validate_non_zero(1).is_ok());
    }

    #[test]
    fn test_validate_sufficient() {
        assert!(validate_sufficient(10, 10).is_ok());
        assert_eq!(
            validate_sufficient(11, 10),
            Err(Error::InsufficientBalance {
                required: 11,
                available: 10
            })
        );
    }

    #[test]
    fn test_validate_address() {
        assert_eq!(validate_address(&Address::ZERO), Err(Error::InvalidAddress));
        assert!(validate_address(&Address::from_label("carol")).is_ok());
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("Athena", "name").is_ok());
        assert!(validate_label("  ", "name").is_err());
    }
}
