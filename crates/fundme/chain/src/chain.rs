use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use fundme_contract::{
    FundMe, FundMeConfig, FundMeError, GasSchedule, ResetStrategy, TransferError, ValueTransfer,
};
use fundme_oracle::{MockV3Aggregator, PriceFeed};
use fundme_types::{Address, Wei};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ChainError;
use crate::receipt::{Method, TxReceipt, TxStatus};

/// Flat cost of any transaction.
pub const TX_BASE_GAS: u64 = 21_000;

/// Extra cost of a contract creation.
pub const CREATION_GAS: u64 = 32_000;

/// Code attached to an account that runs when value arrives.
///
/// The hook sees the paying contract through a shared reference only; returning an
/// error makes the transfer fail.
pub trait Receiver {
    fn on_receive(
        &mut self,
        from: Address,
        amount: Wei,
        contract: &FundMe,
    ) -> Result<(), TransferError>;
}

/// Single-node chain hosting one FundMe deployment.
///
/// Every transaction mines one block and leaves a [`TxReceipt`], reverted ones
/// included. Value attached to a reverted call is returned to the caller.
pub struct LocalChain {
    pub(crate) network: String,
    pub(crate) gas: GasSchedule,
    pub(crate) block_number: u64,
    pub(crate) accounts: BTreeMap<Address, Wei>,
    pub(crate) nonces: BTreeMap<Address, u64>,
    pub(crate) mocks: BTreeMap<Address, Arc<MockV3Aggregator>>,
    pub(crate) feeds: BTreeMap<Address, Arc<dyn PriceFeed>>,
    pub(crate) receivers: HashMap<Address, Box<dyn Receiver>>,
    pub(crate) fund_me: Option<FundMe>,
    pub(crate) receipts: Vec<TxReceipt>,
}

/// Value-transfer primitive handed to the contract during withdrawals.
struct ChainTransfer<'a> {
    from: Address,
    accounts: &'a mut BTreeMap<Address, Wei>,
    receivers: &'a mut HashMap<Address, Box<dyn Receiver>>,
}

impl ValueTransfer for ChainTransfer<'_> {
    fn send(&mut self, to: Address, amount: Wei, contract: &FundMe) -> Result<(), TransferError> {
        if let Some(receiver) = self.receivers.get_mut(&to) {
            receiver.on_receive(self.from, amount, contract)?;
        }

        let balance = self.accounts.get(&to).copied().unwrap_or_default();
        let credited = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::new(format!("balance overflow crediting {}", to)))?;
        self.accounts.insert(to, credited);
        Ok(())
    }
}

impl LocalChain {
    pub fn new(network: impl Into<String>, gas: GasSchedule) -> Self {
        Self {
            network: network.into(),
            gas,
            block_number: 0,
            accounts: BTreeMap::new(),
            nonces: BTreeMap::new(),
            mocks: BTreeMap::new(),
            feeds: BTreeMap::new(),
            receivers: HashMap::new(),
            fund_me: None,
            receipts: Vec::new(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn gas_schedule(&self) -> &GasSchedule {
        &self.gas
    }

    /// Credit new native value to an account.
    pub fn mint(&mut self, account: Address, amount: Wei) -> Result<(), ChainError> {
        let balance = self.accounts.get(&account).copied().unwrap_or_default();
        let credited = balance
            .checked_add(amount)
            .ok_or(ChainError::BalanceOverflow(account))?;
        self.accounts.insert(account, credited);
        debug!(account = %account, amount = %amount, "Minted");
        Ok(())
    }

    /// Native balance of an account or of the FundMe contract.
    pub fn balance_of(&self, account: &Address) -> Wei {
        match &self.fund_me {
            Some(fund_me) if fund_me.address() == *account => fund_me.balance(),
            _ => self.accounts.get(account).copied().unwrap_or_default(),
        }
    }

    /// Native balances of all externally owned accounts.
    pub fn accounts(&self) -> &BTreeMap<Address, Wei> {
        &self.accounts
    }

    pub fn set_receiver(&mut self, account: Address, receiver: Box<dyn Receiver>) {
        self.receivers.insert(account, receiver);
    }

    pub fn remove_receiver(&mut self, account: &Address) -> Option<Box<dyn Receiver>> {
        self.receivers.remove(account)
    }

    /// Make an externally operated price feed reachable at its address.
    pub fn register_feed(&mut self, feed: Arc<dyn PriceFeed>) {
        self.feeds.insert(feed.address(), feed);
    }

    pub fn has_feed(&self, address: &Address) -> bool {
        self.feeds.contains_key(address)
    }

    /// Mock aggregator deployed at `address`, if any.
    pub fn mock(&self, address: &Address) -> Option<Arc<MockV3Aggregator>> {
        self.mocks.get(address).cloned()
    }

    /// Deploy a mock aggregator; the receipt's `to` is its address.
    pub fn deploy_mock_aggregator(
        &mut self,
        deployer: Address,
        decimals: u8,
        initial_answer: i128,
    ) -> TxReceipt {
        let address = self.next_contract_address(&deployer);
        let mock = Arc::new(MockV3Aggregator::new(address, decimals, initial_answer));
        self.mocks.insert(address, Arc::clone(&mock));
        self.feeds.insert(address, mock);
        info!(
            feed = %address,
            decimals = decimals,
            answer = initial_answer,
            "Deployed mock aggregator"
        );
        self.record(
            deployer,
            address,
            Method::DeployPriceFeed,
            Wei::ZERO,
            Wei::ZERO,
            TxStatus::Success,
            CREATION_GAS,
        )
    }

    /// Deploy FundMe owned by `deployer`, reading `price_feed`.
    pub fn deploy_fund_me(
        &mut self,
        deployer: Address,
        price_feed: Address,
        config: FundMeConfig,
    ) -> Result<TxReceipt, ChainError> {
        if let Some(existing) = &self.fund_me {
            return Err(ChainError::AlreadyDeployed(existing.address()));
        }
        let feed = self
            .feeds
            .get(&price_feed)
            .cloned()
            .ok_or_else(|| ChainError::UnknownPriceFeed(price_feed.to_string()))?;

        let address = self.next_contract_address(&deployer);
        self.fund_me = Some(FundMe::new(address, deployer, feed, config));
        Ok(self.record(
            deployer,
            address,
            Method::DeployFundMe,
            Wei::ZERO,
            Wei::ZERO,
            TxStatus::Success,
            CREATION_GAS,
        ))
    }

    pub fn fund_me(&self) -> Result<&FundMe, ChainError> {
        self.fund_me.as_ref().ok_or(ChainError::NotDeployed)
    }

    /// Call `fund` with `value` attached.
    pub fn fund(&mut self, caller: Address, value: Wei) -> Result<TxReceipt, ChainError> {
        let fund_me = self.fund_me.as_mut().ok_or(ChainError::NotDeployed)?;
        let contract = fund_me.address();

        let balance = self.accounts.get(&caller).copied().unwrap_or_default();
        let remaining = balance
            .checked_sub(value)
            .ok_or(ChainError::InsufficientBalance {
                account: caller,
                balance,
                required: value,
            })?;

        // value travels with the call
        self.accounts.insert(caller, remaining);
        let outcome = fund_me.fund(caller, value);

        let (status, gas, error) = match outcome {
            Ok(receipt) => (TxStatus::Success, receipt.storage.cost(&self.gas), None),
            Err(error) => {
                self.accounts.insert(caller, balance);
                (reverted(&error), 0, Some(error))
            }
        };

        let receipt = self.record(caller, contract, Method::Fund, value, Wei::ZERO, status, gas);
        finish(receipt, error)
    }

    /// Call `withdraw`.
    pub fn withdraw(&mut self, caller: Address) -> Result<TxReceipt, ChainError> {
        self.withdraw_with(caller, ResetStrategy::Direct)
    }

    /// Call `cheaperWithdraw`.
    pub fn cheaper_withdraw(&mut self, caller: Address) -> Result<TxReceipt, ChainError> {
        self.withdraw_with(caller, ResetStrategy::CopyThenBulkClear)
    }

    fn withdraw_with(
        &mut self,
        caller: Address,
        strategy: ResetStrategy,
    ) -> Result<TxReceipt, ChainError> {
        let fund_me = self.fund_me.as_mut().ok_or(ChainError::NotDeployed)?;
        let contract = fund_me.address();
        let method = match strategy {
            ResetStrategy::Direct => Method::Withdraw,
            ResetStrategy::CopyThenBulkClear => Method::CheaperWithdraw,
        };

        let mut transfer = ChainTransfer {
            from: contract,
            accounts: &mut self.accounts,
            receivers: &mut self.receivers,
        };
        let outcome = fund_me.withdraw_with(strategy, caller, &mut transfer);

        let (status, paid_out, gas, error) = match outcome {
            Ok(receipt) => (
                TxStatus::Success,
                receipt.amount,
                receipt.storage.cost(&self.gas),
                None,
            ),
            Err(error) => (reverted(&error), Wei::ZERO, 0, Some(error)),
        };

        let receipt = self.record(caller, contract, method, Wei::ZERO, paid_out, status, gas);
        finish(receipt, error)
    }

    pub fn receipts(&self) -> &[TxReceipt] {
        &self.receipts
    }

    /// Mine empty blocks.
    pub fn mine(&mut self, blocks: u64) -> u64 {
        self.block_number += blocks;
        self.block_number
    }

    /// Mine until `receipt` has at least `confirmations` confirmations.
    pub fn wait(&mut self, receipt: &TxReceipt, confirmations: u64) -> u64 {
        let have = receipt.confirmations(self.block_number);
        if have < confirmations {
            self.mine(confirmations - have);
        }
        self.block_number
    }

    fn next_contract_address(&mut self, deployer: &Address) -> Address {
        let nonce = self.nonces.get(deployer).copied().unwrap_or_default();
        let mut seed = deployer.as_bytes().to_vec();
        seed.extend_from_slice(&nonce.to_le_bytes());
        Address::derive("fundme-contract", &seed)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        from: Address,
        to: Address,
        method: Method,
        value: Wei,
        paid_out: Wei,
        status: TxStatus,
        gas: u64,
    ) -> TxReceipt {
        self.block_number += 1;
        *self.nonces.entry(from).or_default() += 1;

        let receipt = TxReceipt {
            tx_id: Uuid::new_v4(),
            block_number: self.block_number,
            timestamp: Utc::now(),
            from,
            to,
            method,
            value,
            paid_out,
            status,
            gas_used: TX_BASE_GAS + gas,
        };
        self.receipts.push(receipt.clone());
        receipt
    }
}

fn reverted(error: &FundMeError) -> TxStatus {
    warn!(code = error.code(), error = %error, "Transaction reverted");
    TxStatus::Reverted {
        code: error.code().to_string(),
        reason: error.to_string(),
    }
}

fn finish(receipt: TxReceipt, error: Option<FundMeError>) -> Result<TxReceipt, ChainError> {
    match error {
        Some(error) => Err(ChainError::Reverted {
            tx_id: receipt.tx_id,
            error,
        }),
        None => Ok(receipt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: &str) -> Address {
        Address::derive("chain-test", seed.as_bytes())
    }

    fn chain_with_contract() -> (LocalChain, Address) {
        let mut chain = LocalChain::new("hardhat", GasSchedule::default());
        let deployer = addr("deployer");
        chain.mint(deployer, Wei::from_ether(100)).unwrap();
        let feed = chain.deploy_mock_aggregator(deployer, 8, 2000 * 100_000_000).to;
        chain
            .deploy_fund_me(deployer, feed, FundMeConfig::default())
            .unwrap();
        (chain, deployer)
    }

    #[test]
    fn fund_moves_value_into_contract() {
        let (mut chain, deployer) = chain_with_contract();
        let contract = chain.fund_me().unwrap().address();
        let receipt = chain.fund(deployer, Wei::from_ether(1)).unwrap();
        assert!(receipt.succeeded());
        assert!(receipt.gas_used > TX_BASE_GAS);
        assert_eq!(chain.balance_of(&deployer), Wei::from_ether(99));
        assert_eq!(chain.balance_of(&contract), Wei::from_ether(1));
    }

    #[test]
    fn reverted_fund_returns_value() {
        let (mut chain, deployer) = chain_with_contract();
        let err = chain.fund(deployer, Wei::new(1)).unwrap_err();
        assert_eq!(
            err.contract_error().map(FundMeError::code),
            Some("FundMe__InsufficientValue")
        );
        assert_eq!(chain.balance_of(&deployer), Wei::from_ether(100));
        let last = chain.receipts().last().unwrap();
        assert!(!last.succeeded());
        assert_eq!(last.gas_used, TX_BASE_GAS);
    }

    #[test]
    fn fund_without_balance_is_rejected_before_execution() {
        let (mut chain, _) = chain_with_contract();
        let receipts = chain.receipts().len();
        let err = chain.fund(Address::random(), Wei::from_ether(1)).unwrap_err();
        assert!(matches!(err, ChainError::InsufficientBalance { .. }));
        assert_eq!(chain.receipts().len(), receipts);
    }

    #[test]
    fn calls_before_deployment_fail() {
        let mut chain = LocalChain::new("hardhat", GasSchedule::default());
        assert!(matches!(chain.withdraw(addr("x")), Err(ChainError::NotDeployed)));
        assert!(matches!(chain.fund_me(), Err(ChainError::NotDeployed)));
    }

    #[test]
    fn second_deployment_is_rejected() {
        let (mut chain, deployer) = chain_with_contract();
        let feed = chain.fund_me().unwrap().price_feed();
        assert!(matches!(
            chain.deploy_fund_me(deployer, feed, FundMeConfig::default()),
            Err(ChainError::AlreadyDeployed(_))
        ));
    }

    #[test]
    fn deployments_get_distinct_addresses() {
        let (chain, _) = chain_with_contract();
        let fund_me = chain.fund_me().unwrap();
        assert_ne!(fund_me.address(), fund_me.price_feed());
    }

    #[test]
    fn wait_mines_until_confirmed() {
        let (mut chain, deployer) = chain_with_contract();
        let receipt = chain.fund(deployer, Wei::from_ether(1)).unwrap();
        let block = chain.wait(&receipt, 6);
        assert_eq!(receipt.confirmations(block), 6);
        // already confirmed: no extra blocks
        assert_eq!(chain.wait(&receipt, 2), block);
    }
}
