//! FundMe CLI - Command-line interface for a FundMe deployment
//!
//! The chain lives in a JSON state file between invocations. This CLI lets
//! developers:
//! - Deploy FundMe (and a mock price feed on development networks)
//! - Fund the contract from any account
//! - Withdraw with either withdrawal variant
//! - Inspect the contract, balances and transaction receipts
//! - Move the mock price

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fundme_chain::ChainConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;
mod session;

use commands::{deploy, inspect, price, transact, Context};
use error::CliResult;
use output::OutputFormat;

/// FundMe CLI application
#[derive(Parser)]
#[command(name = "fundme")]
#[command(about = "FundMe - pooled funding contract on a local chain", long_about = None)]
#[command(version)]
struct Cli {
    /// Chain state file
    #[arg(short, long, env = "FUNDME_STATE", default_value = session::DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "FUNDME_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Start a chain and deploy FundMe
    Deploy {
        /// Network name (defaults to the configured default network)
        #[arg(short, long)]
        network: Option<String>,

        /// Number of development accounts
        #[arg(short, long, default_value_t = 10)]
        accounts: usize,

        /// Replace an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Fund the contract
    Fund {
        /// Account index or address
        #[arg(short, long, default_value = "0")]
        from: String,

        /// Amount in ETH
        #[arg(long, default_value = "0.1")]
        value: String,
    },

    /// Withdraw all funds to the owner
    Withdraw {
        /// Use the cheaper withdrawal variant
        #[arg(long)]
        cheaper: bool,

        /// Calling account index or address (defaults to the deployer)
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Show the contract, its funders and account balances
    Show,

    /// Publish a new answer on the mock price feed
    SetPrice {
        /// Raw answer, in the feed's decimals
        #[arg(allow_negative_numbers = true)]
        answer: i128,
    },

    /// List transaction receipts
    Receipts,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(err) = run(cli) {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = ChainConfig::load(cli.config.as_deref())?;
    let ctx = Context {
        state: cli.state,
        config,
        format: cli.output,
    };

    match cli.command {
        Commands::Deploy {
            network,
            accounts,
            force,
        } => deploy::execute(&ctx, network, accounts, force),
        Commands::Fund { from, value } => transact::fund(&ctx, &from, &value),
        Commands::Withdraw { cheaper, from } => {
            transact::withdraw(&ctx, from.as_deref(), cheaper)
        }
        Commands::Show => inspect::show(&ctx),
        Commands::SetPrice { answer } => price::set_price(&ctx, answer),
        Commands::Receipts => inspect::receipts(&ctx),
    }
}
