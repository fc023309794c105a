//! Chain configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fundme_contract::{FundMeConfig, GasSchedule};
use fundme_types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fundme.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown network '{0}'")]
    UnknownNetwork(String),
}

/// Per-network settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address of the live native/USD price feed
    pub eth_usd_price_feed: Option<Address>,

    /// Confirmations to wait for after each transaction
    pub block_confirmations: Option<u64>,
}

/// Mock aggregator deployed on development chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockFeedConfig {
    pub decimals: u8,
    pub initial_answer: i64,
}

impl Default for MockFeedConfig {
    fn default() -> Self {
        Self {
            decimals: 8,
            initial_answer: 2000 * 100_000_000,
        }
    }
}

/// Chain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Networks that get a mock price feed and pre-funded accounts
    pub development_chains: Vec<String>,

    /// Network used when none is given
    pub default_network: String,

    /// Whole native units credited to each development account
    pub dev_account_balance: u64,

    pub mock: MockFeedConfig,

    pub contract: FundMeConfig,

    pub gas: GasSchedule,

    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            "rinkeby".to_string(),
            NetworkConfig {
                eth_usd_price_feed: "0x8A753747A1Fa494EC906cE90E9f37563A8AF630e".parse().ok(),
                block_confirmations: Some(6),
            },
        );
        networks.insert("hardhat".to_string(), NetworkConfig::default());
        networks.insert("localhost".to_string(), NetworkConfig::default());

        Self {
            development_chains: vec!["hardhat".to_string(), "localhost".to_string()],
            default_network: "hardhat".to_string(),
            dev_account_balance: 10_000,
            mock: MockFeedConfig::default(),
            contract: FundMeConfig::default(),
            gas: GasSchedule::default(),
            networks,
        }
    }
}

impl ChainConfig {
    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn is_development(&self, network: &str) -> bool {
        self.development_chains.iter().any(|name| name == network)
    }

    /// Settings of a named network; development chains need no explicit entry.
    pub fn network(&self, name: &str) -> Result<NetworkConfig, ConfigError> {
        match self.networks.get(name) {
            Some(network) => Ok(network.clone()),
            None if self.is_development(name) => Ok(NetworkConfig::default()),
            None => Err(ConfigError::UnknownNetwork(name.to_string())),
        }
    }

    /// Confirmations to wait for on `network`, at least one.
    pub fn block_confirmations(&self, network: &str) -> u64 {
        self.network(network)
            .ok()
            .and_then(|n| n.block_confirmations)
            .unwrap_or(1)
            .max(1)
    }
}
