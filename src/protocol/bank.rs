//! Native currency balances of external accounts.
//!
//! The execution substrate owns these balances; the contract only sees deposits
//! arriving and payouts leaving. [`InMemoryBank`] stands in for the substrate in
//! tests and in the local CLI chain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::treasury::NativeAmount;
use crate::error::{Error, Result};
use crate::utils::crypto::Address;
use crate::utils::validation::validate_address;

/// Native currency accounts held by the execution substrate
pub trait NativeBank {
    /// Balance of `account`
    fn balance(&self, account: &Address) -> NativeAmount;

    /// Add `amount` to `account`
    fn credit(&mut self, account: Address, amount: NativeAmount) -> Result<()>;

    /// Remove `amount` from `account`
    fn debit(&mut self, account: Address, amount: NativeAmount) -> Result<()>;

    /// Check `account` holds at least `amount`
    fn ensure_funds(&self, account: &Address, amount: NativeAmount) -> Result<()> {
        let available = self.balance(account);
        if available < amount {
            return Err(Error::InsufficientNativeBalance {
                required: amount.base_units(),
                available: available.base_units(),
            });
        }
        Ok(())
    }

    /// Check `account` can receive `amount` without overflowing
    fn ensure_can_credit(&self, account: &Address, amount: NativeAmount) -> Result<()> {
        self.balance(account)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(Error::Overflow {
                operation: "native credit".into(),
            })
    }
}

/// Hash-map backed bank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryBank {
    balances: HashMap<Address, NativeAmount>,
}

impl InMemoryBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bank where every account starts with `amount`
    pub fn with_accounts(accounts: &[Address], amount: NativeAmount) -> Self {
        let balances = accounts.iter().map(|a| (*a, amount)).collect();
        Self { balances }
    }

    /// Number of funded accounts
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }
}

impl NativeBank for InMemoryBank {
    fn balance(&self, account: &Address) -> NativeAmount {
        self.balances.get(account).copied().unwrap_or(NativeAmount::ZERO)
    }

    fn credit(&mut self, account: Address, amount: NativeAmount) -> Result<()> {
        validate_address(&account)?;
        let updated = self.balance(&account).checked_add(amount).ok_or(Error::Overflow {
            operation: "native credit".into(),
        })?;
        self.balances.insert(account, updated);
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: NativeAmount) -> Result<()> {
        self.ensure_funds(&account, amount)?;
        let remaining = self.balance(&account).saturating_sub(amount);
        if remaining.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, remaining);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let alice = Address::from_label("alice");
        let mut bank = InMemoryBank::new();

        bank.credit(alice, NativeAmount::from_whole(10)).unwrap();
        bank.debit(alice, NativeAmount::from_whole(4)).unwrap();
        assert_eq!(bank.balance(&alice), NativeAmount::from_whole(6));

        let result = bank.debit(alice, NativeAmount::from_whole(7));
        assert!(matches!(result, Err(Error::InsufficientNativeBalance { .. })));
        assert_eq!(bank.balance(&alice), NativeAmount::from_whole(6));
    }

    #[test]
    fn test_null_account_cannot_be_credited() {
        let mut bank = InMemoryBank::new();
        assert_eq!(
            bank.credit(Address::ZERO, NativeAmount::from_whole(1)),
            Err(Error::InvalidAddress)
        );
    }

    #[test]
    fn test_with_accounts() {
        let accounts = [Address::from_label("a"), Address::from_label("b")];
        let bank = InMemoryBank::with_accounts(&accounts, NativeAmount::from_whole(1000));
        assert_eq!(bank.account_count(), 2);
        assert_eq!(bank.balance(&accounts[1]), NativeAmount::from_whole(1000));
    }
}
