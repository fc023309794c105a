//! Contract calls: fund and withdraw

use fundme_chain::TxReceipt;
use fundme_types::Wei;

use super::Context;
use crate::error::{CliError, CliResult};
use crate::output::{print_json, print_progress, print_success, OutputFormat};
use crate::session::Session;

/// Send `value` ether from `from` to the contract.
pub fn fund(ctx: &Context, from: &str, value: &str) -> CliResult<()> {
    let mut session = Session::load(&ctx.state)?;
    let caller = session.resolve(from)?;
    let value = Wei::parse_ether(value)
        .map_err(|e| CliError::InvalidInput(format!("--value {}: {}", value, e)))?;

    print_progress("Funding contract...", ctx.format);
    let mut chain = session.open_chain()?;
    let result = chain.fund(caller, value);
    let confirmations = ctx.config.block_confirmations(chain.network());
    if let Ok(receipt) = &result {
        chain.wait(receipt, confirmations);
    }
    session.update(&chain);
    session.save(&ctx.state)?;

    let receipt = result?;
    if let OutputFormat::Json = ctx.format {
        return print_json(&receipt);
    }
    print_success(&format!(
        "Funded {} ETH from {}",
        receipt.value.format_ether(),
        caller
    ));
    print_gas(&receipt);
    Ok(())
}

/// Withdraw everything to the owner, calling as `from`.
pub fn withdraw(ctx: &Context, from: Option<&str>, cheaper: bool) -> CliResult<()> {
    let mut session = Session::load(&ctx.state)?;
    let caller = match from {
        Some(account) => session.resolve(account)?,
        None => session.deployer(),
    };

    print_progress("Withdrawing...", ctx.format);
    let mut chain = session.open_chain()?;
    let result = if cheaper {
        chain.cheaper_withdraw(caller)
    } else {
        chain.withdraw(caller)
    };
    let confirmations = ctx.config.block_confirmations(chain.network());
    if let Ok(receipt) = &result {
        chain.wait(receipt, confirmations);
    }
    session.update(&chain);
    session.save(&ctx.state)?;

    let receipt = result?;
    if let OutputFormat::Json = ctx.format {
        return print_json(&receipt);
    }
    print_success(&format!(
        "Withdrawn {} ETH to {}",
        receipt.paid_out.format_ether(),
        caller
    ));
    print_gas(&receipt);
    Ok(())
}

fn print_gas(receipt: &TxReceipt) {
    println!(
        "  tx {} in block {}, gas used {}",
        receipt.tx_id, receipt.block_number, receipt.gas_used
    );
}
