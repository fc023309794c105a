//! Local host chain for FundMe.
//!
//! Supplies what the contract treats as its environment: native account balances,
//! value that travels with a call and is returned when the call reverts, the
//! value-transfer primitive used by withdrawals, and a receipt per transaction.
//! Development networks get a mock price aggregator and pre-funded accounts.

#![deny(unsafe_code)]

pub mod chain;
pub mod config;
pub mod deploy;
pub mod error;
pub mod receipt;
pub mod snapshot;

pub use chain::{LocalChain, Receiver, CREATION_GAS, TX_BASE_GAS};
pub use config::{ChainConfig, ConfigError, MockFeedConfig, NetworkConfig};
pub use deploy::{deploy_for_network, dev_accounts, launch, Deployment};
pub use error::ChainError;
pub use receipt::{Method, TxReceipt, TxStatus};
pub use snapshot::ChainSnapshot;
