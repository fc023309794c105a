use fundme_contract::{FundMeError, StateError};
use fundme_oracle::OracleError;
use fundme_types::{Address, Wei};
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;

/// Host chain errors.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Transaction {tx_id} reverted with {}: {error}", .error.code())]
    Reverted { tx_id: Uuid, error: FundMeError },

    #[error("Account {account} holds {balance} wei, {required} wei required")]
    InsufficientBalance {
        account: Address,
        balance: Wei,
        required: Wei,
    },

    #[error("FundMe is not deployed")]
    NotDeployed,

    #[error("FundMe is already deployed at {0}")]
    AlreadyDeployed(Address),

    #[error("No price feed available: {0}")]
    UnknownPriceFeed(String),

    #[error("Balance overflow crediting {0}")]
    BalanceOverflow(Address),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),
}

impl ChainError {
    /// Contract failure behind a reverted transaction, if any.
    pub fn contract_error(&self) -> Option<&FundMeError> {
        match self {
            Self::Reverted { error, .. } => Some(error),
            _ => None,
        }
    }
}
