//! Local execution substrate.
//!
//! Pairs one deployed contract with a native bank and applies both sides of
//! every call under a single mutex: either the contract call and the native
//! balance movement both happen, or neither does.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::core::config::DeploymentConfig;
use crate::core::exchange::{UnwrapReceipt, WrapReceipt};
use crate::core::token::TokenAmount;
use crate::core::treasury::NativeAmount;
use crate::error::{Error, Result};
use crate::protocol::bank::{InMemoryBank, NativeBank};
use crate::protocol::contract::{AthenaWrap, ContractState};
use crate::utils::crypto::Address;
use crate::utils::validation::{validate_address, validate_non_zero};

/// Serializable image of a [`LocalChain`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Contract state
    pub contract: ContractState,
    /// Native balances
    pub bank: InMemoryBank,
}

/// One contract deployed on an in-process substrate
#[derive(Debug)]
pub struct LocalChain<B: NativeBank = InMemoryBank> {
    contract: AthenaWrap,
    bank: Mutex<B>,
}

impl<B: NativeBank> LocalChain<B> {
    /// Deploy a contract on top of `bank`
    pub fn deploy(config: DeploymentConfig, bank: B) -> Result<Self> {
        let contract = AthenaWrap::deploy(config)?;
        if bank.balance(&contract.address()) != NativeAmount::ZERO {
            return Err(Error::InvalidParameter {
                name: "bank".into(),
                reason: "the contract address already holds native currency".into(),
            });
        }
        Ok(Self {
            contract,
            bank: Mutex::new(bank),
        })
    }

    /// The deployed contract, for read calls and token transfers
    pub fn contract(&self) -> &AthenaWrap {
        &self.contract
    }

    fn bank(&self) -> Result<MutexGuard<'_, B>> {
        self.bank.lock().map_err(|_| Error::Lock)
    }

    /// Native balance of an external account
    pub fn native_balance(&self, account: &Address) -> Result<NativeAmount> {
        Ok(self.bank()?.balance(account))
    }

    /// Faucet: credit native currency to an external account
    pub fn fund(&self, account: Address, amount: NativeAmount) -> Result<()> {
        validate_non_zero(amount.base_units())?;
        self.ensure_external(&account, "account")?;
        self.bank()?.credit(account, amount)
    }

    /// The contract's native holdings live in its custody, never in the bank
    fn ensure_external(&self, account: &Address, name: &str) -> Result<()> {
        if *account == self.contract.address() {
            return Err(Error::InvalidParameter {
                name: name.into(),
                reason: "the contract holds native currency only through wraps".into(),
            });
        }
        Ok(())
    }

    /// Send native currency. Sending to the contract address wraps it.
    pub fn send(&self, from: Address, to: Address, value: NativeAmount) -> Result<Option<WrapReceipt>> {
        validate_address(&from)?;
        validate_address(&to)?;
        self.ensure_external(&from, "from")?;
        let mut bank = self.bank()?;

        if to == self.contract.address() {
            bank.ensure_funds(&from, value)?;
            let receipt = self.contract.receive(from, value)?;
            bank.debit(from, value)?;
            return Ok(Some(receipt));
        }

        bank.ensure_funds(&from, value)?;
        bank.ensure_can_credit(&to, value)?;
        bank.debit(from, value)?;
        bank.credit(to, value)?;
        debug!(from = %from.short(), to = %to.short(), value = %value, "native transfer");
        Ok(None)
    }

    /// Wrap: shorthand for sending `value` to the contract
    pub fn wrap(&self, from: Address, value: NativeAmount) -> Result<WrapReceipt> {
        let contract = self.contract.address();
        self.send(from, contract, value)?.ok_or_else(|| {
            Error::InvariantViolation("deposit to the contract produced no wrap".into())
        })
    }

    /// Unwrap `amount` tokens and pay the holder out
    pub fn unwrap(&self, caller: Address, amount: TokenAmount) -> Result<UnwrapReceipt> {
        let mut bank = self.bank()?;
        validate_address(&caller)?;
        bank.ensure_can_credit(&caller, NativeAmount::from_base_units(amount.base_units()))?;

        let receipt = self.contract.unwrap(caller, amount)?;
        bank.credit(caller, receipt.payout)?;
        Ok(receipt)
    }

    /// Withdraw accrued fees to the owner
    pub fn withdraw(&self, caller: Address) -> Result<NativeAmount> {
        let mut bank = self.bank()?;
        bank.ensure_can_credit(&caller, self.contract.withdrawable())?;

        let amount = self.contract.withdraw(caller)?;
        bank.credit(caller, amount)?;
        Ok(amount)
    }
}

impl LocalChain<InMemoryBank> {
    /// Capture contract and bank state
    pub fn snapshot(&self) -> Result<ChainSnapshot> {
        let bank = self.bank()?;
        Ok(ChainSnapshot {
            contract: self.contract.snapshot(),
            bank: bank.clone(),
        })
    }

    /// Rebuild a chain from a snapshot
    pub fn restore(snapshot: ChainSnapshot) -> Result<Self> {
        snapshot.contract.verify_invariants()?;
        Ok(Self {
            contract: AthenaWrap::from_state(snapshot.contract),
            bank: Mutex::new(snapshot.bank),
        })
    }
}
