use std::collections::BTreeMap;

use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};

use crate::config::FundMeConfig;

/// Persisted contract state.
///
/// Holds everything needed to rebuild a [`crate::FundMe`] except the live price feed,
/// which is re-attached by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundMeState {
    pub address: Address,
    pub owner: Address,
    pub price_feed: Address,
    pub config: FundMeConfig,
    pub funders: Vec<Address>,
    pub amounts: BTreeMap<Address, Wei>,
    pub held: Wei,
}

impl FundMeState {
    /// Content digest of the canonical JSON encoding.
    ///
    /// Map keys are ordered, so equal states always produce equal digests.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"fundme-state-v1:");
        hasher.update(&bytes);
        hex::encode(hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FundMeState {
        let alice = Address::derive("state", b"alice");
        FundMeState {
            address: Address::derive("state", b"contract"),
            owner: Address::derive("state", b"owner"),
            price_feed: Address::derive("state", b"feed"),
            config: FundMeConfig::default(),
            funders: vec![alice],
            amounts: BTreeMap::from([(alice, Wei::from_ether(1))]),
            held: Wei::from_ether(1),
        }
    }

    #[test]
    fn digest_is_stable() {
        assert_eq!(state().digest(), state().digest());
        assert_eq!(state().digest().len(), 64);
    }

    #[test]
    fn digest_tracks_any_change() {
        let mut changed = state();
        changed.held = Wei::from_ether(2);
        assert_ne!(changed.digest(), state().digest());
    }
}
