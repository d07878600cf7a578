//! The wrap contract - public surface over ledger, exchange engine and treasury.
//!
//! Every mutating call takes the single write lock for its whole duration, so no
//! other caller can observe a half-applied wrap, unwrap, transfer or withdrawal.
//! The caller identity is trusted as handed in by the execution substrate.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::core::config::DeploymentConfig;
use crate::core::exchange::{ExchangeEngine, UnwrapReceipt, WrapReceipt};
use crate::core::fees::TaxPolicy;
use crate::core::token::{Ledger, TokenAmount};
use crate::core::treasury::{NativeAmount, Treasury};
use crate::error::{Error, Result};
use crate::protocol::events::{ContractEvent, EventKind, EventLog};
use crate::utils::crypto::{Address, Hash};

// ═══════════════════════════════════════════════════════════════════════════════
// CONTRACT STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete contract state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractState {
    /// Deployment parameters
    pub config: DeploymentConfig,
    /// Token balances
    pub ledger: Ledger,
    /// Wrap/unwrap engine and counters
    pub engine: ExchangeEngine,
    /// Native custody and fees
    pub treasury: Treasury,
    /// Emitted events
    pub events: EventLog,
}

impl ContractState {
    /// Build the initial state for a deployment
    pub fn deploy(config: DeploymentConfig) -> Result<Self> {
        config.validate()?;

        let ledger = Ledger::new(
            config.name.clone(),
            config.symbol.clone(),
            TokenAmount::from_base_units(config.total_supply),
            config.initial_holder_address(),
        )?;
        let engine = ExchangeEngine::new(TaxPolicy::new(config.tax_divisor)?, config.contract_address)?;
        let treasury = Treasury::new(config.owner)?;
        let events = EventLog::new(config.event_capacity);

        Ok(Self {
            config,
            ledger,
            engine,
            treasury,
            events,
        })
    }

    /// Verify state invariants
    pub fn verify_invariants(&self) -> Result<()> {
        self.ledger.verify_supply_invariant()?;
        if self.treasury.custody() < self.treasury.withdrawable() {
            return Err(Error::InvariantViolation(format!(
                "custody {} below fee residue {}",
                self.treasury.custody(),
                self.treasury.withdrawable()
            )));
        }
        Ok(())
    }

    /// Compute state hash
    pub fn hash(&self) -> Hash {
        let mut data = self.ledger.state_hash().as_bytes().to_vec();
        data.extend_from_slice(&self.engine.total_wrapped().base_units().to_be_bytes());
        data.extend_from_slice(&self.engine.total_unwrapped().base_units().to_be_bytes());
        data.extend_from_slice(&self.treasury.custody().base_units().to_be_bytes());
        data.extend_from_slice(&self.treasury.fees_collected().base_units().to_be_bytes());
        data.extend_from_slice(&self.treasury.fees_withdrawn().base_units().to_be_bytes());
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

/// A deployed wrap contract
#[derive(Debug)]
pub struct AthenaWrap {
    state: RwLock<ContractState>,
}

impl AthenaWrap {
    /// Deploy a new contract
    pub fn deploy(config: DeploymentConfig) -> Result<Self> {
        let state = ContractState::deploy(config)?;
        info!(
            contract = %state.config.contract_address.short(),
            owner = %state.config.owner.short(),
            holder = %state.config.initial_holder_address().short(),
            supply = %state.ledger.total_supply(),
            "contract deployed"
        );
        Ok(Self::from_state(state))
    }

    /// Restore a contract from a saved state
    pub fn from_state(state: ContractState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ContractState {
        self.read().clone()
    }

    // Reads never fail: state is only written after every check has passed,
    // so a poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, ContractState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ContractState>> {
        self.state.write().map_err(|_| Error::Lock)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // METADATA
    // ═══════════════════════════════════════════════════════════════════════════

    /// Contract address
    pub fn address(&self) -> Address {
        self.read().config.contract_address
    }

    /// Owner address
    pub fn owner(&self) -> Address {
        self.read().treasury.owner()
    }

    /// Token name
    pub fn name(&self) -> String {
        self.read().ledger.name.clone()
    }

    /// Token symbol
    pub fn symbol(&self) -> String {
        self.read().ledger.symbol.clone()
    }

    /// Token decimals
    pub fn decimals(&self) -> u8 {
        self.read().ledger.decimals
    }

    /// Fixed total supply
    pub fn total_supply(&self) -> TokenAmount {
        self.read().ledger.total_supply()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TOKEN
    // ═══════════════════════════════════════════════════════════════════════════

    /// Token balance of `holder`
    pub fn balance_of(&self, holder: &Address) -> Result<TokenAmount> {
        self.read().ledger.balance_of(holder)
    }

    /// Allowance `owner` granted to `spender`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.read().ledger.allowance(owner, spender)
    }

    /// Move `amount` tokens from `caller` to `to`
    pub fn transfer(&self, caller: Address, to: Address, amount: TokenAmount) -> Result<()> {
        let mut state = self.write()?;
        state.ledger.transfer(caller, to, amount)?;
        state.events.emit(EventKind::Transfer {
            from: caller,
            to,
            value: amount,
        });
        debug!(from = %caller.short(), to = %to.short(), amount = %amount, "transfer");
        Ok(())
    }

    /// Allow `spender` to move up to `amount` of `caller`'s tokens
    pub fn approve(&self, caller: Address, spender: Address, amount: TokenAmount) -> Result<()> {
        let mut state = self.write()?;
        state.ledger.approve(caller, spender, amount)?;
        state.events.emit(EventKind::Approval {
            owner: caller,
            spender,
            value: amount,
        });
        debug!(owner = %caller.short(), spender = %spender.short(), amount = %amount, "approval");
        Ok(())
    }

    /// Move `amount` from `from` to `to`, spending `caller`'s allowance
    pub fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<()> {
        let mut state = self.write()?;
        state.ledger.transfer_from(caller, from, to, amount)?;
        state.events.emit(EventKind::Transfer {
            from,
            to,
            value: amount,
        });
        debug!(
            spender = %caller.short(),
            from = %from.short(),
            to = %to.short(),
            amount = %amount,
            "transfer from"
        );
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXCHANGE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit trigger: wrap `value` native sent by `sender`.
    ///
    /// Custody changes here without a bank movement; [`LocalChain`](crate::protocol::chain::LocalChain)
    /// pairs the two.
    pub(crate) fn receive(&self, sender: Address, value: NativeAmount) -> Result<WrapReceipt> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        let receipt = state
            .engine
            .wrap(&mut state.ledger, &mut state.treasury, sender, value)?;

        let reserve = state.engine.reserve();
        state.events.emit(EventKind::Transfer {
            from: reserve,
            to: sender,
            value: receipt.credited,
        });
        state.events.emit(EventKind::Wrapped(receipt));
        Ok(receipt)
    }

    /// Redeem `amount` tokens; the receipt's payout is owed to `caller`
    pub(crate) fn unwrap(&self, caller: Address, amount: TokenAmount) -> Result<UnwrapReceipt> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        let receipt = state
            .engine
            .unwrap(&mut state.ledger, &mut state.treasury, caller, amount)?;

        let reserve = state.engine.reserve();
        state.events.emit(EventKind::Transfer {
            from: caller,
            to: reserve,
            value: amount,
        });
        state.events.emit(EventKind::Unwrapped(receipt));
        Ok(receipt)
    }

    /// Tax a wrap of `amount` would pay
    pub fn precalculate_tax_for_wrap(&self, amount: NativeAmount) -> Result<NativeAmount> {
        self.read().engine.precalculate_tax_for_wrap(amount)
    }

    /// Cumulative gross native wrapped
    pub fn total_wrapped(&self) -> NativeAmount {
        self.read().engine.total_wrapped()
    }

    /// Cumulative gross tokens unwrapped
    pub fn total_unwrapped(&self) -> TokenAmount {
        self.read().engine.total_unwrapped()
    }

    /// Cumulative gross native wrapped by `holder`
    pub fn total_wrapped_by_address(&self, holder: &Address) -> Result<NativeAmount> {
        self.read().engine.total_wrapped_by_address(holder)
    }

    /// Cumulative gross tokens unwrapped by `holder`
    pub fn total_unwrapped_by_address(&self, holder: &Address) -> Result<TokenAmount> {
        self.read().engine.total_unwrapped_by_address(holder)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TREASURY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Drain the fee residue; only the owner may call this
    pub(crate) fn withdraw(&self, caller: Address) -> Result<NativeAmount> {
        let mut state = self.write()?;
        let amount = state.treasury.withdraw(caller)?;
        state.events.emit(EventKind::FeesWithdrawn {
            owner: caller,
            amount,
        });
        Ok(amount)
    }

    /// Fee residue the owner could withdraw now
    pub fn withdrawable(&self) -> NativeAmount {
        self.read().treasury.withdrawable()
    }

    /// Native currency held by the contract
    pub fn custody(&self) -> NativeAmount {
        self.read().treasury.custody()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// The most recent `n` events, oldest first
    pub fn recent_events(&self, n: usize) -> Vec<ContractEvent> {
        self.read().events.recent(n).into_iter().cloned().collect()
    }

    /// Verify state invariants
    pub fn verify_invariants(&self) -> Result<()> {
        self.read().verify_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn deploy() -> AthenaWrap {
        AthenaWrap::deploy(DeploymentConfig::new(owner())).unwrap()
    }

    #[test]
    fn test_deploy_self_reserve() {
        let contract = deploy();
        let c = contract.address();
        assert_eq!(
            contract.balance_of(&c).unwrap().base_units(),
            1_000_000_000 * 10u128.pow(18)
        );
        assert_eq!(contract.total_wrapped(), NativeAmount::ZERO);
        assert_eq!(contract.total_unwrapped(), TokenAmount::ZERO);
        assert_eq!(contract.decimals(), 18);
        assert_eq!(contract.name(), "Athena");
    }

    #[test]
    fn test_deploy_explicit_holder() {
        let holder = Address::from_label("holder");
        let contract =
            AthenaWrap::deploy(DeploymentConfig::new(owner()).with_initial_holder(holder)).unwrap();
        assert_eq!(contract.balance_of(&holder).unwrap(), contract.total_supply());
        assert_eq!(contract.balance_of(&contract.address()).unwrap(), TokenAmount::ZERO);
    }

    #[test]
    fn test_wrap_emits_transfer_and_wrapped() {
        let contract = deploy();
        let alice = Address::from_label("alice");
        contract.receive(alice, NativeAmount::from_whole(1)).unwrap();

        let events = contract.recent_events(10);
        let types: Vec<_> = events.iter().map(|e| e.kind.event_type()).collect();
        assert_eq!(types, vec!["Transfer", "Wrapped"]);
    }

    #[test]
    fn test_failed_operations_emit_nothing() {
        let contract = deploy();
        let alice = Address::from_label("alice");

        assert!(contract.receive(alice, NativeAmount::ZERO).is_err());
        assert!(contract.unwrap(alice, TokenAmount::from_whole(1)).is_err());
        assert!(contract.withdraw(owner()).is_err());
        assert!(contract.transfer(alice, owner(), TokenAmount::from_whole(1)).is_err());
        assert!(contract.recent_events(10).is_empty());
    }

    #[test]
    fn test_transfer_back_to_reserve_refills_it() {
        let holder = Address::from_label("holder");
        let alice = Address::from_label("alice");
        let contract =
            AthenaWrap::deploy(DeploymentConfig::new(owner()).with_initial_holder(holder)).unwrap();

        assert!(matches!(
            contract.receive(alice, NativeAmount::from_whole(1)),
            Err(Error::InsufficientBalance { .. })
        ));

        contract
            .transfer(holder, contract.address(), TokenAmount::from_whole(10))
            .unwrap();
        let receipt = contract.receive(alice, NativeAmount::from_whole(1)).unwrap();
        assert_eq!(contract.balance_of(&alice).unwrap(), receipt.credited);
        contract.verify_invariants().unwrap();
    }

    #[test]
    fn test_withdraw_flow() {
        let contract = deploy();
        let alice = Address::from_label("alice");
        let mallory = Address::from_label("mallory");

        assert!(matches!(contract.withdraw(mallory), Err(Error::Unauthorized(_))));
        assert_eq!(contract.withdraw(owner()), Err(Error::ZeroAmount));

        contract.receive(alice, NativeAmount::from_whole(5)).unwrap();
        assert!(matches!(contract.withdraw(mallory), Err(Error::Unauthorized(_))));

        let amount = contract.withdraw(owner()).unwrap();
        assert_eq!(amount.base_units(), 5 * 10u128.pow(15));
        assert_eq!(contract.withdrawable(), NativeAmount::ZERO);
    }

    #[test]
    fn test_concurrent_wraps_preserve_invariants() {
        let contract = Arc::new(deploy());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let contract = Arc::clone(&contract);
                thread::spawn(move || {
                    let holder = Address::from_label(&format!("holder-{}", i));
                    for _ in 0..25 {
                        contract.receive(holder, NativeAmount::from_whole(2)).unwrap();
                    }
                    let balance = contract.balance_of(&holder).unwrap();
                    contract.unwrap(holder, balance).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        contract.verify_invariants().unwrap();
        assert_eq!(contract.total_wrapped(), NativeAmount::from_whole(400));
        assert_eq!(contract.balance_of(&contract.address()).unwrap(), contract.total_supply());
        assert_eq!(contract.custody(), contract.withdrawable());
    }
}
