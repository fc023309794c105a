//! Read-only commands: show and receipts

use fundme_oracle::{PriceConverter, PriceFeed};
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use crate::session::Session;

/// Table row for a registry entry
#[derive(Debug, Serialize, Tabled)]
struct FunderRow {
    index: usize,
    funder: String,
    /// Cumulative contribution in ETH
    funded: String,
}

/// Table row for an account balance
#[derive(Debug, Serialize, Tabled)]
struct AccountRow {
    index: usize,
    address: String,
    balance: String,
}

/// Table row for a transaction receipt
#[derive(Debug, Serialize, Tabled)]
struct ReceiptRow {
    block: u64,
    method: String,
    from: String,
    value: String,
    paid_out: String,
    gas: u64,
    status: String,
}

/// Contract overview
#[derive(Debug, Serialize)]
struct ContractView {
    network: String,
    address: String,
    owner: String,
    price_feed: String,
    price_answer: i128,
    price_decimals: u8,
    /// USD value of one ETH, 18 decimals
    usd_per_eth: String,
    minimum_usd: u64,
    balance: String,
    state_digest: String,
    funders: Vec<FunderRow>,
    accounts: Vec<AccountRow>,
}

/// Print the contract, its registry and account balances.
pub fn show(ctx: &Context) -> CliResult<()> {
    let session = Session::load(&ctx.state)?;
    let chain = session.open_chain()?;
    let fund_me = chain.fund_me()?;
    let feed = fund_me.feed();

    let funders = fund_me
        .funders()
        .iter()
        .enumerate()
        .map(|(index, funder)| FunderRow {
            index,
            funder: funder.to_string(),
            funded: fund_me.address_to_amount_funded(funder).format_ether(),
        })
        .collect();
    let accounts = session
        .accounts
        .iter()
        .enumerate()
        .map(|(index, account)| AccountRow {
            index,
            address: account.to_string(),
            balance: chain.balance_of(account).format_ether(),
        })
        .collect();

    let view = ContractView {
        network: chain.network().to_string(),
        address: fund_me.address().to_string(),
        owner: fund_me.owner().to_string(),
        price_feed: fund_me.price_feed().to_string(),
        price_answer: feed.latest_answer(),
        price_decimals: feed.decimals(),
        usd_per_eth: PriceConverter::price(feed.as_ref()).to_string(),
        minimum_usd: fund_me.config().minimum_usd,
        balance: fund_me.balance().format_ether(),
        state_digest: fund_me.state_digest(),
        funders,
        accounts,
    };

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Table => {
            println!("Network:     {}", view.network);
            println!("FundMe:      {}", view.address);
            println!("Owner:       {}", view.owner);
            println!(
                "Price feed:  {} (answer {}, {} decimals)",
                view.price_feed, view.price_answer, view.price_decimals
            );
            println!("Minimum:     {} USD", view.minimum_usd);
            println!("Balance:     {} ETH", view.balance);
            println!("Digest:      {}", view.state_digest);
            println!("\nFunders:");
            output::print_output(view.funders, OutputFormat::Table)?;
            println!("\nAccounts:");
            output::print_output(view.accounts, OutputFormat::Table)?;
        }
    }
    Ok(())
}

/// Print every recorded transaction.
pub fn receipts(ctx: &Context) -> CliResult<()> {
    let session = Session::load(&ctx.state)?;
    let rows = session
        .chain
        .receipts
        .iter()
        .map(|receipt| ReceiptRow {
            block: receipt.block_number,
            method: receipt.method.to_string(),
            from: receipt.from.short(),
            value: receipt.value.format_ether(),
            paid_out: receipt.paid_out.format_ether(),
            gas: receipt.gas_used,
            status: receipt.status.to_string(),
        })
        .collect();
    output::print_output(rows, ctx.format)
}
