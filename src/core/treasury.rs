//! Treasury for the native base currency held in custody.
//!
//! This module tracks:
//! - Native currency received through wraps and paid out through unwraps
//! - Tax accrued in both directions
//! - Owner-gated withdrawal of the accrued fee residue

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::token::format_base_units;
use crate::error::{Error, Result};
use crate::utils::constants::BASE_UNIT;
use crate::utils::crypto::Address;
use crate::utils::validation::validate_address;

// ═══════════════════════════════════════════════════════════════════════════════
// NATIVE AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed amount of the native base currency (18 decimals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NativeAmount(u128);

impl NativeAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from base units
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from whole units of the native currency
    pub fn from_whole(whole: u128) -> Self {
        Self(whole * BASE_UNIT)
    }

    /// Get raw base units
    pub fn base_units(&self) -> u128 {
        self.0
    }

    /// Get formatted string representation
    pub fn to_string_formatted(&self) -> String {
        format_base_units(self.0)
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl std::fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_formatted())
    }
}

impl From<u128> for NativeAmount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl From<NativeAmount> for u128 {
    fn from(amount: NativeAmount) -> Self {
        amount.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREASURY
// ═══════════════════════════════════════════════════════════════════════════════

/// Native currency custody and fee accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treasury {
    /// Only identity allowed to withdraw fees
    owner: Address,
    /// Native currency currently held by the contract
    custody: NativeAmount,
    /// Cumulative tax collected
    fees_collected: NativeAmount,
    /// Cumulative tax withdrawn by the owner
    fees_withdrawn: NativeAmount,
}

impl Treasury {
    /// Create an empty treasury owned by `owner`
    pub fn new(owner: Address) -> Result<Self> {
        validate_address(&owner)?;
        Ok(Self {
            owner,
            custody: NativeAmount::ZERO,
            fees_collected: NativeAmount::ZERO,
            fees_withdrawn: NativeAmount::ZERO,
        })
    }

    /// Owner identity
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Native currency held in custody
    pub fn custody(&self) -> NativeAmount {
        self.custody
    }

    /// Cumulative tax collected
    pub fn fees_collected(&self) -> NativeAmount {
        self.fees_collected
    }

    /// Cumulative tax withdrawn
    pub fn fees_withdrawn(&self) -> NativeAmount {
        self.fees_withdrawn
    }

    /// Residue the owner may currently withdraw
    pub fn withdrawable(&self) -> NativeAmount {
        self.fees_collected.saturating_sub(self.fees_withdrawn)
    }

    /// Take a deposit into custody, `tax` of which accrues as fee
    pub(crate) fn receive_deposit(&mut self, value: NativeAmount, tax: NativeAmount) -> Result<()> {
        let custody = self.custody.checked_add(value).ok_or(Error::Overflow {
            operation: "treasury custody".into(),
        })?;
        let collected = self.fees_collected.checked_add(tax).ok_or(Error::Overflow {
            operation: "fees collected".into(),
        })?;
        self.custody = custody;
        self.fees_collected = collected;
        Ok(())
    }

    /// Check custody can cover a payout, without reserving it.
    ///
    /// The accrued residue and the new `tax` stay in custody, so only the
    /// remainder backs payouts.
    pub(crate) fn ensure_payout_covered(&self, payout: NativeAmount, tax: NativeAmount) -> Result<()> {
        let overflow = || Error::Overflow {
            operation: "fees collected".into(),
        };
        self.fees_collected.checked_add(tax).ok_or_else(overflow)?;

        let required = payout.checked_add(tax).ok_or_else(overflow)?;
        let backing = self.custody.saturating_sub(self.withdrawable());
        if backing < required {
            return Err(Error::InsufficientNativeBalance {
                required: required.base_units(),
                available: backing.base_units(),
            });
        }
        Ok(())
    }

    /// Release a payout from custody, keeping `tax` as fee. Call
    /// [`Treasury::ensure_payout_covered`] first.
    pub(crate) fn release_payout(&mut self, payout: NativeAmount, tax: NativeAmount) {
        self.custody = self.custody.saturating_sub(payout);
        self.fees_collected = NativeAmount(self.fees_collected.0.saturating_add(tax.0));
    }

    /// Drain the full fee residue to the owner
    pub fn withdraw(&mut self, caller: Address) -> Result<NativeAmount> {
        if caller != self.owner {
            warn!(caller = %caller.short(), "rejected withdrawal from non-owner");
            return Err(Error::Unauthorized("only the owner may withdraw".into()));
        }

        let residue = self.withdrawable();
        if residue.is_zero() {
            warn!("rejected withdrawal: no fees accrued");
            return Err(Error::ZeroAmount);
        }

        if self.custody < residue {
            return Err(Error::InvariantViolation(format!(
                "custody {} below fee residue {}",
                self.custody, residue
            )));
        }

        self.custody = self.custody.saturating_sub(residue);
        self.fees_withdrawn = NativeAmount(self.fees_withdrawn.0.saturating_add(residue.0));

        info!(owner = %self.owner.short(), amount = %residue, "fees withdrawn");
        Ok(residue)
    }
}
