//! Mock price feed control

use fundme_oracle::PriceFeed;
use serde::Serialize;

use super::Context;
use crate::error::{CliError, CliResult};
use crate::output::{print_json, print_success, OutputFormat};
use crate::session::Session;

/// Round published by `set-price`
#[derive(Debug, Serialize)]
struct PublishedRound {
    round: u64,
    answer: i128,
    decimals: u8,
}

/// Publish a new answer on the deployment's mock aggregator.
pub fn set_price(ctx: &Context, answer: i128) -> CliResult<()> {
    let mut session = Session::load(&ctx.state)?;
    let chain = session.open_chain()?;
    let feed = session.deployment.price_feed;
    let mock = chain.mock(&feed).ok_or_else(|| {
        CliError::InvalidInput(format!("price feed {} is not a mock aggregator", feed))
    })?;

    let round = mock.update_answer(answer);
    session.update(&chain);
    session.save(&ctx.state)?;

    let published = PublishedRound {
        round,
        answer,
        decimals: mock.decimals(),
    };
    if let OutputFormat::Json = ctx.format {
        return print_json(&published);
    }
    print_success(&format!(
        "Round {} published: {} ({} decimals)",
        published.round, published.answer, published.decimals
    ));
    Ok(())
}
