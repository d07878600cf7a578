//! Athena CLI
//!
//! Runs the wrap contract on a local chain persisted in a data directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;

use athena::cli::{CliApp, CliConfig, Command, OutputFormat};

/// Athena - native currency wrapped into a fixed-supply token
#[derive(Parser)]
#[command(name = "athena")]
#[command(version = athena::VERSION)]
#[command(about = "Command-line interface for a local Athena deployment", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to data directory
    #[arg(short, long, env = "ATHENA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format (text, json, json-pretty)
    #[arg(long)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new contract into the data directory
    Init {
        /// Contract owner (defaults to the operator)
        #[arg(long)]
        owner: Option<String>,

        /// Assign the whole supply to this account instead of the contract
        #[arg(long)]
        holder: Option<String>,

        /// Deployment settings (JSON)
        #[arg(long)]
        deployment: Option<PathBuf>,

        /// Replace an existing deployment
        #[arg(short, long)]
        force: bool,
    },

    /// Credit native currency to an account
    Fund {
        /// Account to credit
        account: String,

        /// Amount in whole units, or base units with a `wei` suffix
        amount: String,
    },

    /// Send native currency to the contract for tokens
    Wrap {
        /// Amount of native currency
        amount: String,

        /// Sender (defaults to the operator)
        #[arg(long)]
        from: Option<String>,
    },

    /// Return tokens to the contract for native currency
    Unwrap {
        /// Amount of tokens
        amount: String,

        /// Holder (defaults to the operator)
        #[arg(long)]
        from: Option<String>,
    },

    /// Transfer tokens
    Transfer {
        /// Recipient (`contract` refills the reserve)
        to: String,

        /// Amount of tokens
        amount: String,

        /// Sender (defaults to the operator)
        #[arg(long)]
        from: Option<String>,
    },

    /// Allow a spender to move tokens
    Approve {
        /// Spender
        spender: String,

        /// Allowance
        amount: String,

        /// Token owner (defaults to the operator)
        #[arg(long)]
        from: Option<String>,
    },

    /// Spend an allowance
    TransferFrom {
        /// Token owner
        owner: String,

        /// Recipient
        to: String,

        /// Amount of tokens
        amount: String,

        /// Spender (defaults to the operator)
        #[arg(long)]
        spender: Option<String>,
    },

    /// Withdraw accrued fees to the owner
    Withdraw {
        /// Caller (defaults to the operator)
        #[arg(long)]
        from: Option<String>,
    },

    /// Show balances of an account
    Balance {
        /// Account (defaults to the operator)
        account: Option<String>,
    },

    /// Show contract statistics
    Stats,

    /// Preview the tax on a wrap
    Tax {
        /// Amount of native currency
        amount: String,
    },

    /// List recent events
    Events {
        /// Maximum number of events
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Only events involving this account
        #[arg(long)]
        account: Option<String>,
    },
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Init {
                owner,
                holder,
                deployment,
                force,
            } => Command::Init {
                owner,
                holder,
                deployment,
                force,
            },
            Commands::Fund { account, amount } => Command::Fund { account, amount },
            Commands::Wrap { amount, from } => Command::Wrap { from, amount },
            Commands::Unwrap { amount, from } => Command::Unwrap { from, amount },
            Commands::Transfer { to, amount, from } => Command::Transfer { from, to, amount },
            Commands::Approve {
                spender,
                amount,
                from,
            } => Command::Approve {
                from,
                spender,
                amount,
            },
            Commands::TransferFrom {
                owner,
                to,
                amount,
                spender,
            } => Command::TransferFrom {
                spender,
                owner,
                to,
                amount,
            },
            Commands::Withdraw { from } => Command::Withdraw { from },
            Commands::Balance { account } => Command::Balance { account },
            Commands::Stats => Command::Stats,
            Commands::Tax { amount } => Command::Tax { amount },
            Commands::Events { limit, account } => Command::Events { limit, account },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════════════════════

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let term = Term::stdout();

    if let Err(e) = run(cli, &term) {
        eprintln!("{} {:#}", console::style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, term: &Term) -> anyhow::Result<()> {
    let config = CliConfig::resolve(cli.data_dir)?;
    config.validate()?;

    let mut app = CliApp::new(config);
    if let Some(format) = cli.format {
        app = app.with_format(format);
    }

    match app.execute(cli.command.into()) {
        Ok(output) => {
            term.write_line(&app.output().render(&output))?;
            Ok(())
        }
        Err(e) if app.output().format().is_json() => {
            term.write_line(&app.output().render_error(&e.to_string()))?;
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
