//! CLI Commands.
//!
//! Every command loads the persisted chain, acts on it, and writes it back
//! only when the action succeeded.

use serde_json::{json, Value};
use std::path::PathBuf;

use super::{parse_account, parse_amount, CliApp, CliError, CliResult, CommandOutput};
use crate::core::config::DeploymentConfig;
use crate::core::exchange::{UnwrapReceipt, WrapReceipt};
use crate::core::token::TokenAmount;
use crate::core::treasury::NativeAmount;
use crate::protocol::bank::InMemoryBank;
use crate::protocol::chain::LocalChain;
use crate::protocol::events::{ContractEvent, EventKind};
use crate::utils::crypto::Address;

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND ENUM
// ═══════════════════════════════════════════════════════════════════════════════

/// All available commands. Account and amount arguments are kept as the
/// user typed them and parsed against the loaded deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Deploy a fresh contract into the data directory
    Init {
        /// Owner account (defaults to the operator)
        owner: Option<String>,
        /// Assign the supply to this account instead of the contract
        holder: Option<String>,
        /// Deployment settings file
        deployment: Option<PathBuf>,
        /// Replace an existing deployment
        force: bool,
    },
    /// Credit native currency to an account
    Fund {
        /// Recipient
        account: String,
        /// Amount
        amount: String,
    },
    /// Send native currency to the contract
    Wrap {
        /// Sender
        from: Option<String>,
        /// Amount
        amount: String,
    },
    /// Redeem tokens for native currency
    Unwrap {
        /// Holder
        from: Option<String>,
        /// Amount
        amount: String,
    },
    /// Move tokens
    Transfer {
        /// Sender
        from: Option<String>,
        /// Recipient
        to: String,
        /// Amount
        amount: String,
    },
    /// Set an allowance
    Approve {
        /// Token owner
        from: Option<String>,
        /// Spender
        spender: String,
        /// Allowance
        amount: String,
    },
    /// Move tokens on behalf of their owner
    TransferFrom {
        /// Spender
        spender: Option<String>,
        /// Token owner
        owner: String,
        /// Recipient
        to: String,
        /// Amount
        amount: String,
    },
    /// Drain the fee residue to the owner
    Withdraw {
        /// Caller
        from: Option<String>,
    },
    /// Show balances and counters for an account
    Balance {
        /// Account
        account: Option<String>,
    },
    /// Show contract-wide figures
    Stats,
    /// Preview the tax on a wrap
    Tax {
        /// Amount
        amount: String,
    },
    /// List recent events
    Events {
        /// Maximum number of events
        limit: usize,
        /// Only events involving this account
        account: Option<String>,
    },
}

impl Command {
    /// Command name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Fund { .. } => "fund",
            Self::Wrap { .. } => "wrap",
            Self::Unwrap { .. } => "unwrap",
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::TransferFrom { .. } => "transfer-from",
            Self::Withdraw { .. } => "withdraw",
            Self::Balance { .. } => "balance",
            Self::Stats => "stats",
            Self::Tax { .. } => "tax",
            Self::Events { .. } => "events",
        }
    }

    /// Run against the app's data directory
    pub fn execute(self, app: &CliApp) -> CliResult<CommandOutput> {
        match self {
            Self::Init {
                owner,
                holder,
                deployment,
                force,
            } => init(app, owner.as_deref(), holder.as_deref(), deployment, force),
            Self::Fund { account, amount } => mutate(app, |chain| {
                let account = parse_account(&account, chain.contract().address())?;
                let amount = NativeAmount::from_base_units(parse_amount(&amount)?);
                chain.fund(account, amount)?;
                Ok(CommandOutput::success_with_data(
                    format!("Funded {} with {}", account, amount),
                    json!({
                        "account": account.to_hex(),
                        "native_balance": chain.native_balance(&account)?.to_string(),
                    }),
                ))
            }),
            Self::Wrap { from, amount } => mutate(app, |chain| {
                let sender = app.operator(from.as_deref(), chain.contract().address())?;
                let value = NativeAmount::from_base_units(parse_amount(&amount)?);
                let receipt = chain.wrap(sender, value)?;
                Ok(CommandOutput::success_with_data(
                    format!("Wrapped {} into {} tokens", receipt.gross, receipt.credited),
                    wrap_json(&receipt),
                ))
            }),
            Self::Unwrap { from, amount } => mutate(app, |chain| {
                let caller = app.operator(from.as_deref(), chain.contract().address())?;
                let amount = TokenAmount::from_base_units(parse_amount(&amount)?);
                let receipt = chain.unwrap(caller, amount)?;
                Ok(CommandOutput::success_with_data(
                    format!("Unwrapped {} tokens for {}", receipt.gross, receipt.payout),
                    unwrap_json(&receipt),
                ))
            }),
            Self::Transfer { from, to, amount } => mutate(app, |chain| {
                let contract = chain.contract().address();
                let sender = app.operator(from.as_deref(), contract)?;
                let to = parse_account(&to, contract)?;
                let amount = TokenAmount::from_base_units(parse_amount(&amount)?);
                chain.contract().transfer(sender, to, amount)?;
                Ok(CommandOutput::success(format!(
                    "Transferred {} from {} to {}",
                    amount, sender, to
                )))
            }),
            Self::Approve {
                from,
                spender,
                amount,
            } => mutate(app, |chain| {
                let contract = chain.contract().address();
                let owner = app.operator(from.as_deref(), contract)?;
                let spender = parse_account(&spender, contract)?;
                let amount = TokenAmount::from_base_units(parse_amount(&amount)?);
                chain.contract().approve(owner, spender, amount)?;
                Ok(CommandOutput::success(format!(
                    "{} may spend {} of {}'s tokens",
                    spender, amount, owner
                )))
            }),
            Self::TransferFrom {
                spender,
                owner,
                to,
                amount,
            } => mutate(app, |chain| {
                let contract = chain.contract().address();
                let spender = app.operator(spender.as_deref(), contract)?;
                let owner = parse_account(&owner, contract)?;
                let to = parse_account(&to, contract)?;
                let amount = TokenAmount::from_base_units(parse_amount(&amount)?);
                chain.contract().transfer_from(spender, owner, to, amount)?;
                Ok(CommandOutput::success_with_data(
                    format!("Transferred {} from {} to {}", amount, owner, to),
                    json!({
                        "remaining_allowance": chain.contract().allowance(&owner, &spender).to_string(),
                    }),
                ))
            }),
            Self::Withdraw { from } => mutate(app, |chain| {
                let caller = app.operator(from.as_deref(), chain.contract().address())?;
                let amount = chain.withdraw(caller)?;
                Ok(CommandOutput::success_with_data(
                    format!("Withdrew {} in fees", amount),
                    json!({
                        "owner": caller.to_hex(),
                        "amount": amount.to_string(),
                        "amount_base_units": amount.base_units().to_string(),
                    }),
                ))
            }),
            Self::Balance { account } => inspect(app, |chain| {
                let contract = chain.contract();
                let holder = app.operator(account.as_deref(), contract.address())?;
                Ok(CommandOutput::success_with_data(
                    format!("Balances of {}", holder),
                    json!({
                        "address": holder.to_hex(),
                        "tokens": contract.balance_of(&holder)?.to_string(),
                        "native": chain.native_balance(&holder)?.to_string(),
                        "total_wrapped": contract.total_wrapped_by_address(&holder)?.to_string(),
                        "total_unwrapped": contract.total_unwrapped_by_address(&holder)?.to_string(),
                    }),
                ))
            }),
            Self::Stats => inspect(app, stats),
            Self::Tax { amount } => inspect(app, |chain| {
                let gross = NativeAmount::from_base_units(parse_amount(&amount)?);
                let tax = chain.contract().precalculate_tax_for_wrap(gross)?;
                Ok(CommandOutput::success_with_data(
                    format!("Wrapping {} pays {} in tax", gross, tax),
                    json!({
                        "gross": gross.to_string(),
                        "tax": tax.to_string(),
                        "net": gross.saturating_sub(tax).to_string(),
                    }),
                ))
            }),
            Self::Events { limit, account } => inspect(app, |chain| {
                let contract = chain.contract();
                let events: Vec<ContractEvent> = match account {
                    Some(account) => {
                        let address = parse_account(&account, contract.address())?;
                        let state = contract.snapshot();
                        let matching = state.events.for_address(&address);
                        let skip = matching.len().saturating_sub(limit);
                        let selected = matching.into_iter().skip(skip).cloned().collect();
                        selected
                    }
                    None => contract.recent_events(limit),
                };
                Ok(CommandOutput::success_with_data(
                    format!("{} event(s)", events.len()),
                    Value::Array(events.iter().map(event_json).collect()),
                ))
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

fn init(
    app: &CliApp,
    owner: Option<&str>,
    holder: Option<&str>,
    deployment: Option<PathBuf>,
    force: bool,
) -> CliResult<CommandOutput> {
    let state = app.state()?;
    if state.has_chain()? && !force {
        return Err(CliError::AlreadyExists(format!(
            "{} (use --force to redeploy)",
            app.config().data_dir.display()
        )));
    }

    let mut config = match deployment {
        Some(path) => {
            let mut loaded = DeploymentConfig::load(path)?;
            if let Some(owner) = owner {
                loaded.owner = parse_account(owner, loaded.contract_address)?;
            }
            loaded
        }
        None => DeploymentConfig::new(app.operator(owner, Address::CONTRACT)?),
    };
    if let Some(holder) = holder {
        let holder = parse_account(holder, config.contract_address)?;
        config = config.with_initial_holder(holder);
    }

    let chain = LocalChain::deploy(config, InMemoryBank::new())?;
    let digest = state.save_chain(&chain)?;

    let config_path = app.config().path();
    if !config_path.exists() {
        app.config().save(&config_path)?;
    }

    let contract = chain.contract();
    let reserve = contract.balance_of(&contract.address())?;
    let mut output = CommandOutput::success_with_data(
        format!("Deployed {} ({}) at {}", contract.name(), contract.symbol(), contract.address()),
        json!({
            "contract": contract.address().to_hex(),
            "owner": contract.owner().to_hex(),
            "total_supply": contract.total_supply().to_string(),
            "reserve": reserve.to_string(),
            "state_digest": digest.to_hex(),
        }),
    );
    if reserve.is_zero() {
        output = output.with_warning(
            "the contract holds no tokens; transfer some to `contract` before wrapping",
        );
    }
    Ok(output)
}

fn stats(chain: &LocalChain<InMemoryBank>) -> CliResult<CommandOutput> {
    let state = chain.contract().snapshot();
    let reserve = state.engine.reserve();
    let reserve_balance = state.ledger.balance_of(&reserve)?;

    Ok(CommandOutput::success_with_data(
        format!("{} ({})", state.ledger.name, state.ledger.symbol),
        json!({
            "contract": reserve.to_hex(),
            "owner": state.treasury.owner().to_hex(),
            "decimals": state.ledger.decimals,
            "total_supply": state.ledger.total_supply().to_string(),
            "reserve": reserve_balance.to_string(),
            "circulating": state.ledger.total_supply().saturating_sub(reserve_balance).to_string(),
            "holders": state.ledger.holder_count(),
            "tax_divisor": state.engine.policy().divisor().to_string(),
            "total_wrapped": state.engine.total_wrapped().to_string(),
            "total_unwrapped": state.engine.total_unwrapped().to_string(),
            "custody": state.treasury.custody().to_string(),
            "fees_collected": state.treasury.fees_collected().to_string(),
            "fees_withdrawn": state.treasury.fees_withdrawn().to_string(),
            "withdrawable": state.treasury.withdrawable().to_string(),
            "events_emitted": state.events.total_emitted(),
            "state_hash": state.hash().to_hex(),
        }),
    ))
}

/// Load, run, and persist only if `f` succeeded
fn mutate<F>(app: &CliApp, f: F) -> CliResult<CommandOutput>
where
    F: FnOnce(&LocalChain<InMemoryBank>) -> CliResult<CommandOutput>,
{
    let state = app.state()?;
    let chain = app.load_chain(&state)?;
    let output = f(&chain)?;
    state.save_chain(&chain)?;
    Ok(output)
}

fn inspect<F>(app: &CliApp, f: F) -> CliResult<CommandOutput>
where
    F: FnOnce(&LocalChain<InMemoryBank>) -> CliResult<CommandOutput>,
{
    let state = app.state()?;
    let chain = app.load_chain(&state)?;
    f(&chain)
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON VIEWS
// ═══════════════════════════════════════════════════════════════════════════════

// Amounts are rendered as strings: they routinely exceed what a JSON number
// can carry exactly.

fn wrap_json(receipt: &WrapReceipt) -> Value {
    json!({
        "holder": receipt.holder.to_hex(),
        "gross": receipt.gross.to_string(),
        "tax": receipt.tax.to_string(),
        "credited": receipt.credited.to_string(),
    })
}

fn unwrap_json(receipt: &UnwrapReceipt) -> Value {
    json!({
        "holder": receipt.holder.to_hex(),
        "gross": receipt.gross.to_string(),
        "tax": receipt.tax.to_string(),
        "payout": receipt.payout.to_string(),
    })
}

fn event_json(event: &ContractEvent) -> Value {
    let detail = match &event.kind {
        EventKind::Transfer { from, to, value } => json!({
            "from": from.to_hex(),
            "to": to.to_hex(),
            "value": value.to_string(),
        }),
        EventKind::Approval {
            owner,
            spender,
            value,
        } => json!({
            "owner": owner.to_hex(),
            "spender": spender.to_hex(),
            "value": value.to_string(),
        }),
        EventKind::Wrapped(receipt) => wrap_json(receipt),
        EventKind::Unwrapped(receipt) => unwrap_json(receipt),
        EventKind::FeesWithdrawn { owner, amount } => json!({
            "owner": owner.to_hex(),
            "amount": amount.to_string(),
        }),
    };
    json!({
        "sequence": event.sequence,
        "hash": event.hash().to_hex(),
        "timestamp": event.timestamp.to_rfc3339(),
        "type": event.kind.event_type(),
        "detail": detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliConfig;
    use crate::error::Error;

    fn app(dir: &tempfile::TempDir) -> CliApp {
        let mut config = CliConfig::new(dir.path());
        config.operator = Some("owner".into());
        CliApp::new(config)
    }

    fn run(app: &CliApp, command: Command) -> CommandOutput {
        app.execute(command).unwrap()
    }

    fn init_default(app: &CliApp) {
        run(
            app,
            Command::Init {
                owner: None,
                holder: None,
                deployment: None,
                force: false,
            },
        );
    }

    fn data(output: &CommandOutput, field: &str) -> String {
        output.data.as_ref().unwrap()[field].as_str().unwrap().to_string()
    }

    #[test]
    fn test_init_twice_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        init_default(&app);

        let again = app.execute(Command::Init {
            owner: None,
            holder: None,
            deployment: None,
            force: false,
        });
        assert!(matches!(again, Err(CliError::AlreadyExists(_))));

        let forced = app.execute(Command::Init {
            owner: None,
            holder: None,
            deployment: None,
            force: true,
        });
        assert!(forced.is_ok());
    }

    #[test]
    fn test_commands_before_init_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            app(&dir).execute(Command::Stats),
            Err(CliError::NotFound(_))
        ));
    }

    #[test]
    fn test_wrap_unwrap_withdraw_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        init_default(&app);

        run(&app, Command::Fund { account: "alice".into(), amount: "10".into() });
        let wrapped = run(&app, Command::Wrap { from: Some("alice".into()), amount: "5".into() });
        assert_eq!(data(&wrapped, "credited"), "4.995");

        let balance = run(&app, Command::Balance { account: Some("alice".into()) });
        assert_eq!(data(&balance, "tokens"), "4.995");
        assert_eq!(data(&balance, "native"), "5");

        let unwrapped = run(&app, Command::Unwrap { from: Some("alice".into()), amount: "4.995".into() });
        assert_eq!(data(&unwrapped, "payout"), "4.990005");

        let withdrawn = run(&app, Command::Withdraw { from: None });
        assert_eq!(data(&withdrawn, "amount"), "0.009995");

        let events = run(&app, Command::Events { limit: 10, account: Some("alice".into()) });
        let events = events.data.unwrap();
        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e["hash"].as_str().unwrap().len() == 64));
    }

    #[test]
    fn test_failed_command_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        init_default(&app);

        let result = app.execute(Command::Wrap { from: Some("pauper".into()), amount: "1".into() });
        assert!(matches!(
            result,
            Err(CliError::Contract(Error::InsufficientNativeBalance { .. }))
        ));

        let stats = run(&app, Command::Stats);
        assert_eq!(data(&stats, "total_wrapped"), "0");
    }

    #[test]
    fn test_holder_variant_needs_refill() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let output = run(
            &app,
            Command::Init {
                owner: None,
                holder: Some("owner".into()),
                deployment: None,
                force: false,
            },
        );
        assert_eq!(output.warnings.len(), 1);

        run(&app, Command::Fund { account: "alice".into(), amount: "1".into() });
        let result = app.execute(Command::Wrap { from: Some("alice".into()), amount: "1".into() });
        assert!(matches!(
            result,
            Err(CliError::Contract(Error::InsufficientBalance { .. }))
        ));

        run(
            &app,
            Command::Transfer { from: None, to: "contract".into(), amount: "100".into() },
        );
        assert!(app
            .execute(Command::Wrap { from: Some("alice".into()), amount: "1".into() })
            .is_ok());
    }

    #[test]
    fn test_allowance_commands() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        init_default(&app);

        run(&app, Command::Fund { account: "alice".into(), amount: "2".into() });
        run(&app, Command::Wrap { from: Some("alice".into()), amount: "2".into() });
        run(
            &app,
            Command::Approve { from: Some("alice".into()), spender: "bob".into(), amount: "1".into() },
        );
        let moved = run(
            &app,
            Command::TransferFrom {
                spender: Some("bob".into()),
                owner: "alice".into(),
                to: "carol".into(),
                amount: "0.25".into(),
            },
        );
        assert_eq!(data(&moved, "remaining_allowance"), "0.75");
    }

    #[test]
    fn test_tax_preview() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        init_default(&app);

        let preview = run(&app, Command::Tax { amount: "5".into() });
        assert_eq!(data(&preview, "tax"), "0.005");
        assert_eq!(data(&preview, "net"), "4.995");
    }
}
