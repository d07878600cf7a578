//! Exchange engine: wrap native currency into tokens and unwrap them back.
//!
//! Tokens are never minted or burned. A wrap moves `net` tokens out of the reserve
//! (the contract's own balance) to the depositor; an unwrap moves the redeemed
//! tokens back into the reserve. The sum of all balances therefore stays equal
//! to the fixed total supply.
//!
//! Every operation validates all preconditions before the first write, so a
//! rejected request leaves ledger, treasury and counters untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::core::fees::{TaxCalculation, TaxPolicy};
use crate::core::token::{Ledger, TokenAmount};
use crate::core::treasury::{NativeAmount, Treasury};
use crate::error::{Error, Result};
use crate::utils::crypto::Address;
use crate::utils::validation::{validate_address, validate_non_zero, validate_sufficient};

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIPTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of a successful wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapReceipt {
    /// Depositor
    pub holder: Address,
    /// Native value deposited
    pub gross: NativeAmount,
    /// Native value kept as fee
    pub tax: NativeAmount,
    /// Tokens credited to the depositor
    pub credited: TokenAmount,
}

/// Outcome of a successful unwrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwrapReceipt {
    /// Redeeming holder
    pub holder: Address,
    /// Tokens returned to the reserve
    pub gross: TokenAmount,
    /// Native value kept as fee
    pub tax: NativeAmount,
    /// Native value owed to the holder
    pub payout: NativeAmount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COUNTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cumulative gross wrap/unwrap totals. Never decrease.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeCounters {
    total_wrapped: u128,
    total_unwrapped: u128,
    wrapped_by_address: HashMap<Address, u128>,
    unwrapped_by_address: HashMap<Address, u128>,
}

impl ExchangeCounters {
    fn wrapped_by(&self, holder: &Address) -> u128 {
        self.wrapped_by_address.get(holder).copied().unwrap_or(0)
    }

    fn unwrapped_by(&self, holder: &Address) -> u128 {
        self.unwrapped_by_address.get(holder).copied().unwrap_or(0)
    }
}

/// Add `amount` to an aggregate and a per-holder counter, or fail without writing
fn bump(total: u128, per_holder: u128, amount: u128, what: &str) -> Result<(u128, u128)> {
    let total = total.checked_add(amount).ok_or_else(|| Error::Overflow {
        operation: format!("total {}", what),
    })?;
    let per_holder = per_holder.checked_add(amount).ok_or_else(|| Error::Overflow {
        operation: format!("{} by address", what),
    })?;
    Ok((total, per_holder))
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXCHANGE ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Converts native currency to tokens and back, charging a flat tax each way
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeEngine {
    /// Tax policy
    policy: TaxPolicy,
    /// Identity whose token balance acts as the wrap reserve
    reserve: Address,
    /// Aggregate counters
    counters: ExchangeCounters,
}

impl ExchangeEngine {
    /// Create an engine drawing from `reserve`
    pub fn new(policy: TaxPolicy, reserve: Address) -> Result<Self> {
        validate_address(&reserve)?;
        Ok(Self {
            policy,
            reserve,
            counters: ExchangeCounters::default(),
        })
    }

    /// Reserve identity
    pub fn reserve(&self) -> Address {
        self.reserve
    }

    /// Tax policy
    pub fn policy(&self) -> &TaxPolicy {
        &self.policy
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Cumulative gross native value deposited via wrap
    pub fn total_wrapped(&self) -> NativeAmount {
        NativeAmount::from_base_units(self.counters.total_wrapped)
    }

    /// Cumulative gross tokens redeemed via unwrap
    pub fn total_unwrapped(&self) -> TokenAmount {
        TokenAmount::from_base_units(self.counters.total_unwrapped)
    }

    /// Cumulative gross native value `holder` has wrapped
    pub fn total_wrapped_by_address(&self, holder: &Address) -> Result<NativeAmount> {
        validate_address(holder)?;
        Ok(NativeAmount::from_base_units(self.counters.wrapped_by(holder)))
    }

    /// Cumulative gross tokens `holder` has unwrapped
    pub fn total_unwrapped_by_address(&self, holder: &Address) -> Result<TokenAmount> {
        validate_address(holder)?;
        Ok(TokenAmount::from_base_units(self.counters.unwrapped_by(holder)))
    }

    /// Tax a wrap of `amount` would pay
    pub fn precalculate_tax_for_wrap(&self, amount: NativeAmount) -> Result<NativeAmount> {
        self.policy
            .precalculate_for_wrap(amount.base_units())
            .map(NativeAmount::from_base_units)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Credit `value - tax` tokens to `holder` out of the reserve
    pub fn wrap(
        &mut self,
        ledger: &mut Ledger,
        treasury: &mut Treasury,
        holder: Address,
        value: NativeAmount,
    ) -> Result<WrapReceipt> {
        validate_non_zero(value.base_units())?;
        validate_address(&holder)?;
        if holder == self.reserve {
            return Err(Error::InvalidParameter {
                name: "holder".into(),
                reason: "the reserve cannot wrap into itself".into(),
            });
        }

        let TaxCalculation { gross, tax, net } = self.policy.apply(value.base_units())?;
        validate_sufficient(net, ledger.balance(&self.reserve).base_units())?;
        let (total, by_holder) = bump(
            self.counters.total_wrapped,
            self.counters.wrapped_by(&holder),
            gross,
            "wrapped",
        )?;
        treasury
            .custody()
            .checked_add(value)
            .ok_or(Error::Overflow {
                operation: "treasury custody".into(),
            })?;

        ledger.transfer(self.reserve, holder, TokenAmount::from_base_units(net))?;
        treasury.receive_deposit(value, NativeAmount::from_base_units(tax))?;
        self.counters.total_wrapped = total;
        self.counters.wrapped_by_address.insert(holder, by_holder);

        let receipt = WrapReceipt {
            holder,
            gross: value,
            tax: NativeAmount::from_base_units(tax),
            credited: TokenAmount::from_base_units(net),
        };
        info!(
            holder = %holder.short(),
            gross = %receipt.gross,
            tax = %receipt.tax,
            credited = %receipt.credited,
            "wrapped"
        );
        Ok(receipt)
    }

    /// Return `amount` tokens from `holder` to the reserve; `amount - tax` native is owed back
    pub fn unwrap(
        &mut self,
        ledger: &mut Ledger,
        treasury: &mut Treasury,
        holder: Address,
        amount: TokenAmount,
    ) -> Result<UnwrapReceipt> {
        validate_non_zero(amount.base_units())?;
        validate_address(&holder)?;
        if holder == self.reserve {
            return Err(Error::InvalidParameter {
                name: "holder".into(),
                reason: "the reserve cannot unwrap".into(),
            });
        }
        validate_sufficient(amount.base_units(), ledger.balance(&holder).base_units())?;

        let TaxCalculation { gross, tax, net } = self.policy.apply(amount.base_units())?;
        let payout = NativeAmount::from_base_units(net);
        let tax = NativeAmount::from_base_units(tax);
        treasury.ensure_payout_covered(payout, tax)?;
        let (total, by_holder) = bump(
            self.counters.total_unwrapped,
            self.counters.unwrapped_by(&holder),
            gross,
            "unwrapped",
        )?;

        ledger.transfer(holder, self.reserve, amount)?;
        treasury.release_payout(payout, tax);
        self.counters.total_unwrapped = total;
        self.counters.unwrapped_by_address.insert(holder, by_holder);

        let receipt = UnwrapReceipt {
            holder,
            gross: amount,
            tax,
            payout,
        };
        info!(
            holder = %holder.short(),
            gross = %receipt.gross,
            tax = %receipt.tax,
            payout = %receipt.payout,
            "unwrapped"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::{TOKEN_NAME, TOKEN_SYMBOL, TOTAL_SUPPLY};

    fn reserve() -> Address {
        Address::CONTRACT
    }

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn setup() -> (ExchangeEngine, Ledger, Treasury) {
        let ledger = Ledger::new(
            TOKEN_NAME,
            TOKEN_SYMBOL,
            TokenAmount::from_base_units(TOTAL_SUPPLY),
            reserve(),
        )
        .unwrap();
        let treasury = Treasury::new(owner()).unwrap();
        let engine = ExchangeEngine::new(TaxPolicy::default(), reserve()).unwrap();
        (engine, ledger, treasury)
    }

    #[test]
    fn test_wrap_credits_net_tokens() {
        let (mut engine, mut ledger, mut treasury) = setup();

        let receipt = engine
            .wrap(&mut ledger, &mut treasury, alice(), NativeAmount::from_whole(5))
            .unwrap();

        let tax = 5 * 10u128.pow(15);
        let net = 5 * 10u128.pow(18) - tax;
        assert_eq!(receipt.tax.base_units(), tax);
        assert_eq!(ledger.balance_of(&alice()).unwrap().base_units(), net);
        assert_eq!(engine.total_wrapped(), NativeAmount::from_whole(5));
        assert_eq!(engine.total_unwrapped(), TokenAmount::ZERO);
        assert_eq!(
            engine.total_wrapped_by_address(&alice()).unwrap(),
            NativeAmount::from_whole(5)
        );
        assert_eq!(treasury.withdrawable().base_units(), tax);
        assert!(ledger.verify_supply_invariant().is_ok());
    }

    #[test]
    fn test_wrap_zero_rejected_without_effect() {
        let (mut engine, mut ledger, mut treasury) = setup();
        let before = ledger.state_hash();

        let result = engine.wrap(&mut ledger, &mut treasury, alice(), NativeAmount::ZERO);
        assert_eq!(result, Err(Error::ZeroAmount));
        assert_eq!(ledger.state_hash(), before);
        assert_eq!(engine.total_wrapped(), NativeAmount::ZERO);
        assert_eq!(treasury.custody(), NativeAmount::ZERO);
    }

    #[test]
    fn test_wrap_fails_when_reserve_empty() {
        let mut ledger = Ledger::new("A", "A", TokenAmount::from_whole(10), alice()).unwrap();
        let mut treasury = Treasury::new(owner()).unwrap();
        let mut engine = ExchangeEngine::new(TaxPolicy::default(), reserve()).unwrap();

        let result = engine.wrap(
            &mut ledger,
            &mut treasury,
            Address::from_label("bob"),
            NativeAmount::from_whole(1),
        );
        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
        assert_eq!(treasury.custody(), NativeAmount::ZERO);
        assert_eq!(engine.total_wrapped(), NativeAmount::ZERO);
    }

    #[test]
    fn test_full_unwrap() {
        let (mut engine, mut ledger, mut treasury) = setup();
        let wrapped = engine
            .wrap(&mut ledger, &mut treasury, alice(), NativeAmount::from_whole(5))
            .unwrap();
        let amt = wrapped.credited;

        let receipt = engine
            .unwrap(&mut ledger, &mut treasury, alice(), amt)
            .unwrap();

        let expected_payout = amt.base_units() - amt.base_units() / 1000;
        assert_eq!(receipt.payout.base_units(), expected_payout);
        assert_eq!(ledger.balance_of(&alice()).unwrap(), TokenAmount::ZERO);
        assert_eq!(engine.total_wrapped(), NativeAmount::from_whole(5));
        assert_eq!(engine.total_unwrapped(), amt);
        assert_eq!(engine.total_unwrapped_by_address(&alice()).unwrap(), amt);
        assert_eq!(ledger.balance(&reserve()).base_units(), TOTAL_SUPPLY);

        // Custody keeps exactly the two taxes
        assert_eq!(treasury.custody(), treasury.withdrawable());
        assert_eq!(
            treasury.withdrawable().base_units(),
            wrapped.tax.base_units() + receipt.tax.base_units()
        );
    }

    #[test]
    fn test_unwrap_preconditions() {
        let (mut engine, mut ledger, mut treasury) = setup();

        assert_eq!(
            engine.unwrap(&mut ledger, &mut treasury, alice(), TokenAmount::ZERO),
            Err(Error::ZeroAmount)
        );
        assert!(matches!(
            engine.unwrap(&mut ledger, &mut treasury, alice(), TokenAmount::from_base_units(1)),
            Err(Error::InsufficientBalance { .. })
        ));
        assert_eq!(
            engine.unwrap(&mut ledger, &mut treasury, Address::ZERO, TokenAmount::from_whole(1)),
            Err(Error::InvalidAddress)
        );
        assert_eq!(engine.total_unwrapped(), TokenAmount::ZERO);
    }

    #[test]
    fn test_unwrap_without_custody_fails_cleanly() {
        // Supply handed to alice directly: she holds tokens nobody deposited for
        let mut ledger = Ledger::new("A", "A", TokenAmount::from_whole(10), alice()).unwrap();
        let mut treasury = Treasury::new(owner()).unwrap();
        let mut engine = ExchangeEngine::new(TaxPolicy::default(), reserve()).unwrap();

        let result = engine.unwrap(&mut ledger, &mut treasury, alice(), TokenAmount::from_whole(1));
        assert!(matches!(result, Err(Error::InsufficientNativeBalance { .. })));
        assert_eq!(ledger.balance_of(&alice()).unwrap(), TokenAmount::from_whole(10));
        assert_eq!(engine.total_unwrapped(), TokenAmount::ZERO);
    }

    #[test]
    fn test_null_address_queries() {
        let (engine, _, _) = setup();
        assert_eq!(engine.total_wrapped_by_address(&Address::ZERO), Err(Error::InvalidAddress));
        assert_eq!(engine.total_unwrapped_by_address(&Address::ZERO), Err(Error::InvalidAddress));
        assert_eq!(
            engine.total_wrapped_by_address(&Address::from_label("untouched")).unwrap(),
            NativeAmount::ZERO
        );
    }

    #[test]
    fn test_precalculate_tax() {
        let (engine, _, _) = setup();
        assert_eq!(engine.precalculate_tax_for_wrap(NativeAmount::ZERO), Err(Error::ZeroAmount));
        assert_eq!(
            engine.precalculate_tax_for_wrap(NativeAmount::from_base_units(1000)).unwrap(),
            NativeAmount::from_base_units(1)
        );
    }
}
