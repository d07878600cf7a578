//! Flat-rate tax applied to wraps and unwraps.
//!
//! The tax is computed on the **gross** amount in both directions with truncating
//! integer division: `tax = gross / divisor`. With the default divisor of 1000 this
//! is 0.1%, and amounts below 1000 base units pay no tax.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::TAX_DIVISOR;
use crate::utils::validation::validate_non_zero;

// ═══════════════════════════════════════════════════════════════════════════════
// TAX CALCULATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Breakdown of a taxed amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculation {
    /// Amount before tax
    pub gross: u128,
    /// Tax retained by the treasury
    pub tax: u128,
    /// Amount after tax
    pub net: u128,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TAX POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-rate tax policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    divisor: u128,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            divisor: TAX_DIVISOR,
        }
    }
}

impl TaxPolicy {
    /// Create a policy charging `1 / divisor` of every gross amount
    pub fn new(divisor: u128) -> Result<Self> {
        if divisor == 0 {
            return Err(Error::InvalidParameter {
                name: "tax_divisor".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self { divisor })
    }

    /// Get the divisor
    pub fn divisor(&self) -> u128 {
        self.divisor
    }

    /// Tax owed on a gross amount
    pub fn tax_on(&self, gross: u128) -> u128 {
        gross / self.divisor
    }

    /// Split a positive gross amount into tax and net
    pub fn apply(&self, gross: u128) -> Result<TaxCalculation> {
        validate_non_zero(gross)?;
        let tax = self.tax_on(gross);
        Ok(TaxCalculation {
            gross,
            tax,
            net: gross - tax,
        })
    }

    /// Fee a wrap of `amount` would pay, without touching any state
    pub fn precalculate_for_wrap(&self, amount: u128) -> Result<u128> {
        validate_non_zero(amount)?;
        Ok(self.tax_on(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate_is_one_per_mille() {
        let policy = TaxPolicy::default();
        assert_eq!(policy.precalculate_for_wrap(1000).unwrap(), 1);
        assert_eq!(policy.precalculate_for_wrap(999).unwrap(), 0);
        assert_eq!(policy.precalculate_for_wrap(0), Err(Error::ZeroAmount));
    }

    #[test]
    fn test_apply_splits_gross() {
        let policy = TaxPolicy::default();
        let calc = policy.apply(5_000_000_000_000_000_000).unwrap();
        assert_eq!(calc.tax, 5_000_000_000_000_000);
        assert_eq!(calc.net, 4_995_000_000_000_000_000);
        assert_eq!(calc.tax + calc.net, calc.gross);
    }

    #[test]
    fn test_small_amounts_are_untaxed() {
        let calc = TaxPolicy::default().apply(999).unwrap();
        assert_eq!(calc.tax, 0);
        assert_eq!(calc.net, 999);
    }

    #[test]
    fn test_zero_divisor_rejected() {
        assert!(matches!(TaxPolicy::new(0), Err(Error::InvalidParameter { .. })));
        assert_eq!(TaxPolicy::new(100).unwrap().tax_on(1000), 10);
    }
}
