use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by FundMe operations.
///
/// Every variant is distinguishable by name and by [`FundMeError::code`]; none are
/// retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FundMeError {
    #[error("Insufficient value: {attached} wei is worth {usd_value}, minimum {minimum}")]
    InsufficientValue {
        attached: Wei,
        usd_value: u128,
        minimum: u128,
    },

    #[error("Caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("Funder index {index} out of range (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Transfer of {amount} wei to {to} failed: {reason}")]
    TransferFailed {
        to: Address,
        amount: Wei,
        reason: String,
    },

    #[error("Held balance would overflow adding {attached} wei")]
    BalanceOverflow { attached: Wei },
}

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Authorization,
    Range,
    Downstream,
}

impl FundMeError {
    /// Stable identifier for the failure, suitable for matching across process
    /// boundaries.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientValue { .. } => "FundMe__InsufficientValue",
            Self::NotOwner { .. } => "FundMe__NotOwner",
            Self::IndexOutOfRange { .. } => "FundMe__IndexOutOfRange",
            Self::TransferFailed { .. } => "FundMe__TransferFailed",
            Self::BalanceOverflow { .. } => "FundMe__BalanceOverflow",
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientValue { .. } | Self::BalanceOverflow { .. } => {
                FailureKind::Validation
            }
            Self::NotOwner { .. } => FailureKind::Authorization,
            Self::IndexOutOfRange { .. } => FailureKind::Range,
            Self::TransferFailed { .. } => FailureKind::Downstream,
        }
    }
}

/// Failure reported by a value-transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransferError {
    pub reason: String,
}

impl TransferError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors rebuilding a contract from persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Held balance {held} does not match ledger total {ledger_total}")]
    BalanceMismatch { held: Wei, ledger_total: Wei },

    #[error("State references price feed {expected}, but {actual} was supplied")]
    FeedMismatch { expected: Address, actual: Address },
}
