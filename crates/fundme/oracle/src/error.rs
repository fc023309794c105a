use thiserror::Error;

/// Oracle-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("Round {0} not found")]
    RoundNotFound(u64),

    #[error("Invalid aggregator state: {0}")]
    InvalidState(String),
}
