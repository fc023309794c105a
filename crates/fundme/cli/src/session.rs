//! Persisted chain between CLI invocations

use std::path::Path;

use fundme_chain::{ChainSnapshot, Deployment, LocalChain};
use fundme_types::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Default state file, relative to the working directory
pub const DEFAULT_STATE_FILE: &str = "fundme-state.json";

/// Everything `fundme` remembers about a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Development accounts; index 0 is the deployer
    pub accounts: Vec<Address>,
    pub deployment: Deployment,
    pub chain: ChainSnapshot,
}

impl Session {
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::NoSession(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> CliResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), block = self.chain.block_number, "Saved state");
        Ok(())
    }

    /// Rebuild the chain this session describes.
    pub fn open_chain(&self) -> CliResult<LocalChain> {
        Ok(LocalChain::restore(self.chain.clone(), Vec::new())?)
    }

    /// Store the chain's current state.
    pub fn update(&mut self, chain: &LocalChain) {
        self.chain = chain.snapshot();
    }

    /// Resolve an account given by index or by address.
    pub fn resolve(&self, account: &str) -> CliResult<Address> {
        if let Ok(index) = account.parse::<usize>() {
            return self.accounts.get(index).copied().ok_or_else(|| {
                CliError::InvalidInput(format!(
                    "no account #{}, {} available",
                    index,
                    self.accounts.len()
                ))
            });
        }
        account
            .parse()
            .map_err(|e| CliError::InvalidInput(format!("{}: {}", account, e)))
    }

    pub fn deployer(&self) -> Address {
        self.deployment.deployer
    }
}
