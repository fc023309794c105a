//! Deploy command

use fundme_chain::{deploy_for_network, launch};
use tracing::info;

use super::Context;
use crate::error::{CliError, CliResult};
use crate::output::{print_info, print_json, print_success, OutputFormat};
use crate::session::Session;

/// Start a fresh chain for `network` and deploy FundMe on it.
pub fn execute(
    ctx: &Context,
    network: Option<String>,
    accounts: usize,
    force: bool,
) -> CliResult<()> {
    if ctx.state.exists() && !force {
        return Err(CliError::InvalidInput(format!(
            "{} already holds a deployment; pass --force to replace it",
            ctx.state.display()
        )));
    }
    if accounts == 0 {
        return Err(CliError::InvalidInput("at least one account is required".to_string()));
    }

    let network = network.unwrap_or_else(|| ctx.config.default_network.clone());
    let (mut chain, accounts) = launch(&ctx.config, &network, accounts)?;
    let deployer = accounts[0];

    if ctx.config.is_development(&network) {
        print_info(
            &format!("Local network '{}' detected, deploying mocks", network),
            ctx.format,
        );
    }
    let deployment = deploy_for_network(&mut chain, &ctx.config, deployer)?;

    let session = Session {
        accounts,
        deployment,
        chain: chain.snapshot(),
    };
    session.save(&ctx.state)?;
    info!(state = %ctx.state.display(), "Deployment saved");

    if let OutputFormat::Json = ctx.format {
        return print_json(&session.deployment);
    }
    if session.deployment.mocked {
        println!("MockV3Aggregator: {}", session.deployment.price_feed);
    }
    print_success(&format!(
        "FundMe deployed at {} (owner {})",
        session.deployment.fund_me, deployer
    ));
    Ok(())
}
