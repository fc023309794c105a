use std::collections::BTreeMap;
use std::sync::Arc;

use fundme_contract::{FundMe, FundMeState, GasSchedule, StateError};
use fundme_oracle::{AggregatorState, MockV3Aggregator, PriceFeed};
use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::LocalChain;
use crate::error::ChainError;
use crate::receipt::TxReceipt;

/// Serializable image of a [`LocalChain`].
///
/// Mock aggregators and the contract are captured; externally registered feeds and
/// receiver hooks are not and must be attached again after a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub network: String,
    pub gas: GasSchedule,
    pub block_number: u64,
    pub accounts: BTreeMap<Address, Wei>,
    pub nonces: BTreeMap<Address, u64>,
    pub mocks: Vec<AggregatorState>,
    pub contract: Option<FundMeState>,
    /// Digest of `contract`, checked on restore
    pub contract_digest: Option<String>,
    pub receipts: Vec<TxReceipt>,
}

impl LocalChain {
    pub fn snapshot(&self) -> ChainSnapshot {
        let contract = self.fund_me.as_ref().map(FundMe::state);
        let contract_digest = contract.as_ref().map(FundMeState::digest);

        ChainSnapshot {
            network: self.network.clone(),
            gas: self.gas,
            block_number: self.block_number,
            accounts: self.accounts.clone(),
            nonces: self.nonces.clone(),
            mocks: self.mocks.values().map(|mock| mock.state()).collect(),
            contract,
            contract_digest,
            receipts: self.receipts.clone(),
        }
    }

    /// Rebuild a chain from a snapshot.
    ///
    /// `external` feeds are registered before the contract is rebuilt, so a contract
    /// reading a live feed can be restored too.
    pub fn restore(
        snapshot: ChainSnapshot,
        external: Vec<Arc<dyn PriceFeed>>,
    ) -> Result<Self, ChainError> {
        let mut chain = LocalChain::new(snapshot.network, snapshot.gas);
        chain.block_number = snapshot.block_number;
        chain.accounts = snapshot.accounts;
        chain.nonces = snapshot.nonces;
        chain.receipts = snapshot.receipts;

        for feed in external {
            chain.register_feed(feed);
        }
        for state in snapshot.mocks {
            let mock = Arc::new(MockV3Aggregator::from_state(state)?);
            chain.mocks.insert(mock.address(), Arc::clone(&mock));
            chain.feeds.insert(mock.address(), mock);
        }

        if let Some(state) = snapshot.contract {
            if let Some(expected) = &snapshot.contract_digest {
                let actual = state.digest();
                if *expected != actual {
                    return Err(StateError::InvariantViolation(format!(
                        "contract digest mismatch: expected {}, got {}",
                        expected, actual
                    ))
                    .into());
                }
            }

            let feed = chain
                .feeds
                .get(&state.price_feed)
                .cloned()
                .ok_or_else(|| ChainError::UnknownPriceFeed(state.price_feed.to_string()))?;
            chain.fund_me = Some(FundMe::from_state(state, feed)?);
        }

        debug!(
            network = %chain.network,
            block = chain.block_number,
            deployed = chain.fund_me.is_some(),
            "Restored chain"
        );
        Ok(chain)
    }
}
