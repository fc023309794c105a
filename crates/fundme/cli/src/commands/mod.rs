//! Command implementations

pub mod deploy;
pub mod inspect;
pub mod price;
pub mod transact;

use std::path::PathBuf;

use fundme_chain::ChainConfig;

use crate::output::OutputFormat;

/// Settings shared by every command
pub struct Context {
    pub state: PathBuf,
    pub config: ChainConfig,
    pub format: OutputFormat,
}
