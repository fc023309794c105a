//! Network-aware deployment

use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::LocalChain;
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::receipt::TxReceipt;

/// Deterministic development accounts; index 0 deploys and owns the contract.
pub fn dev_accounts(count: usize) -> Vec<Address> {
    (0..count as u64)
        .map(|i| Address::derive("fundme-dev-account", &i.to_le_bytes()))
        .collect()
}

/// Outcome of [`deploy_for_network`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub network: String,
    pub deployer: Address,
    pub price_feed: Address,
    pub fund_me: Address,
    /// Whether the price feed is a freshly deployed mock
    pub mocked: bool,
    pub receipts: Vec<TxReceipt>,
}

/// Start a chain for `network`; development networks get pre-funded accounts.
pub fn launch(
    config: &ChainConfig,
    network: &str,
    accounts: usize,
) -> Result<(LocalChain, Vec<Address>), ChainError> {
    config.network(network)?;

    let mut chain = LocalChain::new(network, config.gas);
    let accounts = dev_accounts(accounts);
    if config.is_development(network) {
        let balance = Wei::from_ether(config.dev_account_balance);
        for account in &accounts {
            chain.mint(*account, balance)?;
        }
    }
    Ok((chain, accounts))
}

/// Deploy FundMe on the chain's network.
///
/// Development networks get a mock aggregator seeded from the configuration. Other
/// networks use the configured feed address, which must already be registered on
/// the chain.
pub fn deploy_for_network(
    chain: &mut LocalChain,
    config: &ChainConfig,
    deployer: Address,
) -> Result<Deployment, ChainError> {
    let network = chain.network().to_string();
    let settings = config.network(&network)?;
    let confirmations = config.block_confirmations(&network);
    let mut receipts = Vec::new();

    let mocked = config.is_development(&network);
    let price_feed = if mocked {
        info!(network = %network, "Development network detected, deploying mock aggregator");
        let receipt = chain.deploy_mock_aggregator(
            deployer,
            config.mock.decimals,
            i128::from(config.mock.initial_answer),
        );
        let feed = receipt.to;
        receipts.push(receipt);
        feed
    } else {
        let feed = settings.eth_usd_price_feed.ok_or_else(|| {
            ChainError::UnknownPriceFeed(format!("no feed configured for network '{}'", network))
        })?;
        if !chain.has_feed(&feed) {
            return Err(ChainError::UnknownPriceFeed(feed.to_string()));
        }
        feed
    };

    let receipt = chain.deploy_fund_me(deployer, price_feed, config.contract)?;
    chain.wait(&receipt, confirmations);
    let fund_me = receipt.to;
    receipts.push(receipt);

    info!(
        network = %network,
        fund_me = %fund_me,
        price_feed = %price_feed,
        owner = %deployer,
        "FundMe deployed"
    );

    Ok(Deployment {
        network,
        deployer,
        price_feed,
        fund_me,
        mocked,
        receipts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_accounts_are_stable_and_distinct() {
        let a = dev_accounts(3);
        let b = dev_accounts(3);
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
        assert_ne!(a[1], a[2]);
    }

    #[test]
    fn launch_funds_development_accounts() {
        let config = ChainConfig::default();
        let (chain, accounts) = launch(&config, "hardhat", 2).unwrap();
        assert_eq!(chain.balance_of(&accounts[0]), Wei::from_ether(10_000));
    }

    #[test]
    fn launch_leaves_live_accounts_empty() {
        let config = ChainConfig::default();
        let (chain, accounts) = launch(&config, "rinkeby", 1).unwrap();
        assert!(chain.balance_of(&accounts[0]).is_zero());
    }

    #[test]
    fn launch_rejects_unknown_network() {
        let config = ChainConfig::default();
        assert!(matches!(
            launch(&config, "mainnet", 1),
            Err(ChainError::Config(_))
        ));
    }
}
