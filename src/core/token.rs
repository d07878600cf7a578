//! Athena token ledger.
//!
//! This module implements the derived fungible token:
//! - Balance tracking
//! - Transfer operations
//! - Allowances (approve / transfer_from)
//! - Fixed total supply bookkeeping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::utils::constants::*;
use crate::utils::crypto::{Address, Hash};
use crate::utils::validation::{validate_address, validate_label, validate_non_zero};

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed token amount in base units (18 decimals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from base units
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from whole tokens
    pub fn from_whole(tokens: u128) -> Self {
        Self(tokens * BASE_UNIT)
    }

    /// Get raw base units
    pub fn base_units(&self) -> u128 {
        self.0
    }

    /// Decimal representation with trailing zeros trimmed, e.g. `4.995`
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

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_formatted())
    }
}

impl From<u128> for TokenAmount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl From<TokenAmount> for u128 {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

/// Render base units as a decimal string with 18 fractional digits, trailing zeros trimmed
pub fn format_base_units(units: u128) -> String {
    let whole = units / BASE_UNIT;
    let frac = units % BASE_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Authoritative balance bookkeeping for the derived token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// Total supply, fixed at construction
    total_supply: TokenAmount,
    /// Balances by holder (zero balances are not stored)
    balances: HashMap<Address, TokenAmount>,
    /// Allowances keyed by (owner, spender)
    allowances: HashMap<(Address, Address), TokenAmount>,
}

impl Ledger {
    /// Create a ledger with the whole supply assigned to `initial_holder`
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        total_supply: TokenAmount,
        initial_holder: Address,
    ) -> Result<Self> {
        let name = name.into();
        let symbol = symbol.into();
        validate_label(&name, "name")?;
        validate_label(&symbol, "symbol")?;
        validate_address(&initial_holder)?;
        validate_non_zero(total_supply.base_units())?;

        let mut balances = HashMap::new();
        balances.insert(initial_holder, total_supply);

        Ok(Self {
            name,
            symbol,
            decimals: TOKEN_DECIMALS,
            total_supply,
            balances,
            allowances: HashMap::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get total supply
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Get balance of a holder; the null address is rejected
    pub fn balance_of(&self, holder: &Address) -> Result<TokenAmount> {
        validate_address(holder)?;
        Ok(self.balance(holder))
    }

    /// Get allowance granted by `owner` to `spender`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Get number of token holders
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Get all balances (for auditing)
    pub fn all_balances(&self) -> &HashMap<Address, TokenAmount> {
        &self.balances
    }

    pub(crate) fn balance(&self, holder: &Address) -> TokenAmount {
        self.balances.get(holder).copied().unwrap_or(TokenAmount::ZERO)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Move `amount` from `from` to `to`
    pub fn transfer(&mut self, from: Address, to: Address, amount: TokenAmount) -> Result<()> {
        validate_address(&from)?;
        validate_address(&to)?;

        let from_balance = self.balance(&from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.base_units(),
                available: from_balance.base_units(),
            });
        }

        if from == to || amount.is_zero() {
            return Ok(());
        }

        // Recipient side is checked before either balance is written
        let new_to_balance = self.balance(&to).checked_add(amount).ok_or(Error::Overflow {
            operation: "transfer balance".into(),
        })?;
        let new_from_balance = from_balance.saturating_sub(amount);

        self.set_balance(from, new_from_balance);
        self.set_balance(to, new_to_balance);

        Ok(())
    }

    /// Set the allowance `owner` grants to `spender`
    pub fn approve(&mut self, owner: Address, spender: Address, amount: TokenAmount) -> Result<()> {
        validate_address(&owner)?;
        validate_address(&spender)?;

        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        Ok(())
    }

    /// Spend `spender`'s allowance over `from` to move tokens to `to`
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<()> {
        let approved = self.allowance(&from, &spender);
        if approved < amount {
            return Err(Error::InsufficientAllowance {
                required: amount.base_units(),
                approved: approved.base_units(),
            });
        }

        self.transfer(from, to, amount)?;

        let remaining = approved.saturating_sub(amount);
        if remaining.is_zero() {
            self.allowances.remove(&(from, spender));
        } else {
            self.allowances.insert((from, spender), remaining);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INVARIANTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Verify supply invariant (total_supply == sum of all balances)
    pub fn verify_supply_invariant(&self) -> Result<()> {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(b.base_units()))
            .ok_or(Error::Overflow {
                operation: "balance sum".into(),
            })?;

        if sum != self.total_supply.base_units() {
            return Err(Error::InvariantViolation(format!(
                "sum of balances {} != total supply {}",
                sum,
                self.total_supply.base_units()
            )));
        }
        Ok(())
    }

    /// Compute a deterministic hash over supply and balances
    pub fn state_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(&self.total_supply.base_units().to_be_bytes());

        let mut sorted_balances: Vec<_> = self.balances.iter().collect();
        sorted_balances.sort_by_key(|(k, _)| **k);

        for (holder, balance) in sorted_balances {
            data.extend_from_slice(holder.as_bytes());
            data.extend_from_slice(&balance.base_units().to_be_bytes());
        }

        Hash::sha256(&data)
    }

    fn set_balance(&mut self, holder: Address, amount: TokenAmount) {
        if amount.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn ledger() -> Ledger {
        Ledger::new(TOKEN_NAME, TOKEN_SYMBOL, TokenAmount::from_whole(1_000), alice()).unwrap()
    }

    #[test]
    fn test_token_amount_formatting() {
        assert_eq!(TokenAmount::from_whole(5).to_string_formatted(), "5");
        assert_eq!(
            TokenAmount::from_base_units(4_995_000_000_000_000_000).to_string_formatted(),
            "4.995"
        );
        assert_eq!(TokenAmount::from_base_units(1).to_string_formatted(), "0.000000000000000001");
    }

    #[test]
    fn test_token_amount_arithmetic() {
        let a = TokenAmount::from_base_units(100);
        let b = TokenAmount::from_base_units(50);

        assert_eq!(a.checked_add(b), Some(TokenAmount::from_base_units(150)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(b.saturating_sub(a), TokenAmount::ZERO);
    }

    #[test]
    fn test_initial_assignment() {
        let token = ledger();
        assert_eq!(token.balance_of(&alice()).unwrap(), TokenAmount::from_whole(1_000));
        assert_eq!(token.total_supply(), TokenAmount::from_whole(1_000));
        assert_eq!(token.holder_count(), 1);
    }

    #[test]
    fn test_new_rejects_null_holder() {
        let result = Ledger::new("A", "A", TokenAmount::from_whole(1), Address::ZERO);
        assert_eq!(result.unwrap_err(), Error::InvalidAddress);
    }

    #[test]
    fn test_balance_of_null_address() {
        assert_eq!(ledger().balance_of(&Address::ZERO), Err(Error::InvalidAddress));
        assert_eq!(ledger().balance_of(&bob()).unwrap(), TokenAmount::ZERO);
    }

    #[test]
    fn test_transfer() {
        let mut token = ledger();
        token.transfer(alice(), bob(), TokenAmount::from_whole(300)).unwrap();

        assert_eq!(token.balance_of(&alice()).unwrap(), TokenAmount::from_whole(700));
        assert_eq!(token.balance_of(&bob()).unwrap(), TokenAmount::from_whole(300));
        assert!(token.verify_supply_invariant().is_ok());
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut token = ledger();
        let result = token.transfer(bob(), alice(), TokenAmount::from_base_units(1));
        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                required: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_transfer_to_null_address() {
        let mut token = ledger();
        let result = token.transfer(alice(), Address::ZERO, TokenAmount::from_whole(1));
        assert_eq!(result, Err(Error::InvalidAddress));
        assert_eq!(token.balance_of(&alice()).unwrap(), TokenAmount::from_whole(1_000));
    }

    #[test]
    fn test_self_and_zero_transfers_are_noops() {
        let mut token = ledger();
        let before = token.state_hash();
        token.transfer(alice(), alice(), TokenAmount::from_whole(10)).unwrap();
        token.transfer(alice(), bob(), TokenAmount::ZERO).unwrap();
        assert_eq!(token.state_hash(), before);
    }

    #[test]
    fn test_holder_removed_when_emptied() {
        let mut token = ledger();
        token.transfer(alice(), bob(), TokenAmount::from_whole(1_000)).unwrap();
        assert_eq!(token.holder_count(), 1);
        assert!(!token.all_balances().contains_key(&alice()));
    }

    #[test]
    fn test_allowance_flow() {
        let mut token = ledger();
        let carol = Address::from_label("carol");

        token.approve(alice(), bob(), TokenAmount::from_whole(50)).unwrap();
        assert_eq!(token.allowance(&alice(), &bob()), TokenAmount::from_whole(50));

        token
            .transfer_from(bob(), alice(), carol, TokenAmount::from_whole(20))
            .unwrap();
        assert_eq!(token.allowance(&alice(), &bob()), TokenAmount::from_whole(30));
        assert_eq!(token.balance_of(&carol).unwrap(), TokenAmount::from_whole(20));

        let result = token.transfer_from(bob(), alice(), carol, TokenAmount::from_whole(31));
        assert!(matches!(result, Err(Error::InsufficientAllowance { .. })));
    }

    #[test]
    fn test_transfer_from_failure_keeps_allowance() {
        let mut token = ledger();
        token.approve(bob(), alice(), TokenAmount::from_whole(5)).unwrap();

        // bob holds nothing, so the transfer itself fails
        let result = token.transfer_from(alice(), bob(), alice(), TokenAmount::from_whole(5));
        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
        assert_eq!(token.allowance(&bob(), &alice()), TokenAmount::from_whole(5));
    }

    #[test]
    fn test_state_hash_deterministic() {
        let mut token1 = ledger();
        let mut token2 = ledger();

        token1.transfer(alice(), bob(), TokenAmount::from_whole(1)).unwrap();
        token2.transfer(alice(), bob(), TokenAmount::from_whole(1)).unwrap();

        assert_eq!(token1.state_hash(), token2.state_hash());
    }
}
