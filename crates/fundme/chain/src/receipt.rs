use chrono::{DateTime, Utc};
use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contract entry point a transaction invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    DeployPriceFeed,
    DeployFundMe,
    Fund,
    Withdraw,
    CheaperWithdraw,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeployPriceFeed => "deploy_price_feed",
            Self::DeployFundMe => "deploy_fund_me",
            Self::Fund => "fund",
            Self::Withdraw => "withdraw",
            Self::CheaperWithdraw => "cheaper_withdraw",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Reverted { code: String, reason: String },
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Reverted { code, .. } => write!(f, "reverted ({})", code),
        }
    }
}

/// Record of one executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_id: Uuid,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub from: Address,
    pub to: Address,
    pub method: Method,
    /// Value attached to the call (returned to `from` on revert).
    pub value: Wei,
    /// Value moved out of the contract by the call.
    pub paid_out: Wei,
    pub status: TxStatus,
    pub gas_used: u64,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, TxStatus::Success)
    }

    /// Blocks mined on top of this receipt's block, counting its own.
    pub fn confirmations(&self, current_block: u64) -> u64 {
        current_block.saturating_sub(self.block_number) + 1
    }
}
