use std::sync::Arc;

use fundme_oracle::{PriceConverter, PriceFeed};
use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::book::FunderBook;
use crate::config::FundMeConfig;
use crate::error::{FundMeError, StateError, TransferError};
use crate::reset::{reset_funders, ResetStrategy};
use crate::state::FundMeState;
use crate::storage::{MeteredBook, StorageMeter};

/// Capability of the hosting environment to move custodied value out.
///
/// `contract` is the contract as any recipient would observe it during the
/// transfer: the withdrawal reset is already applied. Implementations only get a
/// shared view, so a recipient can inspect but never re-enter a mutating call.
pub trait ValueTransfer {
    fn send(&mut self, to: Address, amount: Wei, contract: &FundMe) -> Result<(), TransferError>;
}

/// Outcome of an accepted `fund` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundReceipt {
    pub funder: Address,
    pub amount: Wei,
    /// USD equivalent of `amount` at the price read for this call.
    pub usd_value: u128,
    /// Funder's cumulative contribution after this call.
    pub total_funded: Wei,
    pub storage: StorageMeter,
}

/// Outcome of a successful withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub strategy: ResetStrategy,
    pub recipient: Address,
    pub amount: Wei,
    /// Registry entries processed, duplicates included.
    pub entries_cleared: usize,
    pub storage: StorageMeter,
}

/// The FundMe contract.
///
/// Owner, price feed and configuration are fixed at construction. Every mutating call
/// takes `&mut self` and either commits all of its effects or none.
pub struct FundMe {
    address: Address,
    owner: Address,
    price_feed: Arc<dyn PriceFeed>,
    config: FundMeConfig,
    book: FunderBook,
    held: Wei,
}

impl FundMe {
    /// Construct a contract at `address`, owned by `owner`.
    pub fn new(
        address: Address,
        owner: Address,
        price_feed: Arc<dyn PriceFeed>,
        config: FundMeConfig,
    ) -> Self {
        info!(
            contract = %address,
            owner = %owner,
            price_feed = %price_feed.address(),
            minimum_usd = config.minimum_usd,
            "FundMe constructed"
        );
        Self {
            address,
            owner,
            price_feed,
            config,
            book: FunderBook::new(),
            held: Wei::ZERO,
        }
    }

    /// Rebuild a contract from persisted state, re-attaching its price feed.
    pub fn from_state(
        state: FundMeState,
        price_feed: Arc<dyn PriceFeed>,
    ) -> Result<Self, StateError> {
        if state.price_feed != price_feed.address() {
            return Err(StateError::FeedMismatch {
                expected: state.price_feed,
                actual: price_feed.address(),
            });
        }

        let book = FunderBook::from_parts(state.funders, state.amounts)?;
        let ledger_total = book.total();
        if ledger_total != state.held {
            return Err(StateError::BalanceMismatch {
                held: state.held,
                ledger_total,
            });
        }

        Ok(Self {
            address: state.address,
            owner: state.owner,
            price_feed,
            config: state.config,
            book,
            held: state.held,
        })
    }

    pub fn state(&self) -> FundMeState {
        FundMeState {
            address: self.address,
            owner: self.owner,
            price_feed: self.price_feed.address(),
            config: self.config,
            funders: self.book.funders.clone(),
            amounts: self.book.amounts.clone(),
            held: self.held,
        }
    }

    /// Digest of [`FundMe::state`]; equal digests mean byte-identical state.
    pub fn state_digest(&self) -> String {
        self.state().digest()
    }

    /// Accept `attached` from `caller`.
    ///
    /// Fails with [`FundMeError::InsufficientValue`] when the USD equivalent is below
    /// the configured minimum or nothing is attached; nothing is mutated on failure and
    /// the host is expected to return the attached value.
    pub fn fund(&mut self, caller: Address, attached: Wei) -> Result<FundReceipt, FundMeError> {
        let minimum = self.config.minimum_usd_scaled();
        let usd_value = PriceConverter::conversion_rate(attached, self.price_feed.as_ref());
        if attached.is_zero() || usd_value < minimum {
            warn!(
                caller = %caller,
                attached = %attached,
                usd_value = usd_value,
                minimum = minimum,
                "Fund rejected: below minimum contribution"
            );
            return Err(FundMeError::InsufficientValue {
                attached,
                usd_value,
                minimum,
            });
        }

        let overflow = || FundMeError::BalanceOverflow { attached };
        let held = self.held.checked_add(attached).ok_or_else(overflow)?;

        let mut meter = StorageMeter::new();
        let mut book = MeteredBook::new(&mut self.book, &mut meter);
        let total_funded = book
            .amount_of(&caller)
            .checked_add(attached)
            .ok_or_else(overflow)?;
        book.push_funder(caller);
        book.set_amount(caller, total_funded);
        self.held = held;

        info!(
            caller = %caller,
            amount = %attached,
            total_funded = %total_funded,
            held = %self.held,
            "Funded"
        );

        Ok(FundReceipt {
            funder: caller,
            amount: attached,
            usd_value,
            total_funded,
            storage: meter,
        })
    }

    /// Owner-only: pay out the whole held balance, resetting every contribution.
    pub fn withdraw<T>(
        &mut self,
        caller: Address,
        transfer: &mut T,
    ) -> Result<WithdrawReceipt, FundMeError>
    where
        T: ValueTransfer + ?Sized,
    {
        self.withdraw_with(ResetStrategy::Direct, caller, transfer)
    }

    /// Same contract as [`FundMe::withdraw`] with fewer storage reads: the registry is
    /// copied once and cleared in one write.
    pub fn cheaper_withdraw<T>(
        &mut self,
        caller: Address,
        transfer: &mut T,
    ) -> Result<WithdrawReceipt, FundMeError>
    where
        T: ValueTransfer + ?Sized,
    {
        self.withdraw_with(ResetStrategy::CopyThenBulkClear, caller, transfer)
    }

    /// Withdrawal with an explicit reset strategy.
    ///
    /// The reset is committed before `transfer` runs; if the transfer fails the book
    /// and held balance are restored from a checkpoint and
    /// [`FundMeError::TransferFailed`] is returned.
    pub fn withdraw_with<T>(
        &mut self,
        strategy: ResetStrategy,
        caller: Address,
        transfer: &mut T,
    ) -> Result<WithdrawReceipt, FundMeError>
    where
        T: ValueTransfer + ?Sized,
    {
        self.only_owner(&caller)?;

        let checkpoint = (self.book.clone(), self.held);
        let mut meter = StorageMeter::new();
        let entries_cleared =
            reset_funders(&mut MeteredBook::new(&mut self.book, &mut meter), strategy);
        let payout = std::mem::take(&mut self.held);
        let owner = self.owner;

        debug!(
            strategy = %strategy,
            entries_cleared = entries_cleared,
            payout = %payout,
            "Withdrawal reset committed, transferring"
        );

        if let Err(err) = transfer.send(owner, payout, self) {
            let (book, held) = checkpoint;
            self.book = book;
            self.held = held;
            warn!(
                strategy = %strategy,
                owner = %owner,
                amount = %payout,
                reason = %err,
                "Withdrawal transfer failed, reset rolled back"
            );
            return Err(FundMeError::TransferFailed {
                to: owner,
                amount: payout,
                reason: err.reason,
            });
        }

        info!(
            strategy = %strategy,
            owner = %owner,
            amount = %payout,
            entries_cleared = entries_cleared,
            reads = meter.reads,
            writes = meter.writes,
            "Withdrawn"
        );

        Ok(WithdrawReceipt {
            strategy,
            recipient: owner,
            amount: payout,
            entries_cleared,
            storage: meter,
        })
    }

    fn only_owner(&self, caller: &Address) -> Result<(), FundMeError> {
        if *caller != self.owner {
            warn!(caller = %caller, owner = %self.owner, "Rejected non-owner call");
            return Err(FundMeError::NotOwner { caller: *caller });
        }
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Address of the price feed the contract reads.
    pub fn price_feed(&self) -> Address {
        self.price_feed.address()
    }

    pub fn feed(&self) -> &Arc<dyn PriceFeed> {
        &self.price_feed
    }

    pub fn config(&self) -> &FundMeConfig {
        &self.config
    }

    /// Minimum contribution in scaled USD.
    pub fn minimum_usd(&self) -> u128 {
        self.config.minimum_usd_scaled()
    }

    /// Value currently held by the contract.
    pub fn balance(&self) -> Wei {
        self.held
    }

    pub fn address_to_amount_funded(&self, address: &Address) -> Wei {
        self.book.amount_funded(address)
    }

    pub fn funder(&self, index: usize) -> Result<Address, FundMeError> {
        self.book.funder(index).ok_or(FundMeError::IndexOutOfRange {
            index,
            len: self.book.len(),
        })
    }

    pub fn funders(&self) -> &[Address] {
        self.book.funders()
    }

    pub fn book(&self) -> &FunderBook {
        &self.book
    }

    /// Check invariants 1 and 2 against the live state.
    pub fn verify_invariants(&self) -> Result<(), StateError> {
        self.book.verify()?;
        let ledger_total = self.book.total();
        if ledger_total != self.held {
            return Err(StateError::BalanceMismatch {
                held: self.held,
                ledger_total,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for FundMe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundMe")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("price_feed", &self.price_feed.address())
            .field("config", &self.config)
            .field("funders", &self.book.len())
            .field("held", &self.held)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundme_oracle::MockV3Aggregator;
    use fundme_types::WEI_PER_ETHER;
    use proptest::prelude::*;

    const PRICE: i128 = 2000 * 100_000_000;

    /// Owner wallet that records payouts, optionally refusing them.
    #[derive(Default)]
    struct Wallet {
        received: Vec<(Address, Wei)>,
        refuse: bool,
        observed: Vec<(usize, Wei)>,
    }

    impl ValueTransfer for Wallet {
        fn send(
            &mut self,
            to: Address,
            amount: Wei,
            contract: &FundMe,
        ) -> Result<(), TransferError> {
            self.observed.push((contract.funders().len(), contract.balance()));
            if self.refuse {
                return Err(TransferError::new("recipient refused"));
            }
            self.received.push((to, amount));
            Ok(())
        }
    }

    fn addr(seed: &str) -> Address {
        Address::derive("fund-me-test", seed.as_bytes())
    }

    fn owner() -> Address {
        addr("owner")
    }

    fn feed() -> Arc<MockV3Aggregator> {
        Arc::new(MockV3Aggregator::new(addr("feed"), 8, PRICE))
    }

    fn contract() -> FundMe {
        FundMe::new(addr("contract"), owner(), feed(), FundMeConfig::default())
    }

    fn funded(funders: usize) -> FundMe {
        let mut fund_me = contract();
        for i in 0..funders {
            fund_me
                .fund(addr(&format!("funder-{i}")), Wei::from_ether(1))
                .unwrap();
        }
        fund_me
    }

    #[test]
    fn constructor_sets_owner_and_price_feed() {
        let feed = feed();
        let fund_me = FundMe::new(addr("contract"), owner(), feed.clone(), FundMeConfig::default());
        assert_eq!(fund_me.owner(), owner());
        assert_eq!(fund_me.price_feed(), feed.address());
        assert_eq!(fund_me.balance(), Wei::ZERO);
    }

    #[test]
    fn fund_fails_without_enough_value() {
        let mut fund_me = contract();
        let before = fund_me.state_digest();
        let err = fund_me.fund(addr("alice"), Wei::ZERO).unwrap_err();
        assert_eq!(err.code(), "FundMe__InsufficientValue");
        // $49.99 worth
        let err = fund_me
            .fund(addr("alice"), Wei::new(25 * WEI_PER_ETHER / 1000 - 1))
            .unwrap_err();
        assert!(matches!(err, FundMeError::InsufficientValue { .. }));
        assert_eq!(fund_me.state_digest(), before);
    }

    #[test]
    fn exactly_the_minimum_is_accepted() {
        let mut fund_me = contract();
        // 0.025 ETH at $2000 = $50
        let receipt = fund_me
            .fund(addr("alice"), Wei::new(25 * WEI_PER_ETHER / 1000))
            .unwrap();
        assert_eq!(receipt.usd_value, fund_me.minimum_usd());
    }

    #[test]
    fn dust_is_rejected_at_any_configured_minimum() {
        let mut fund_me = FundMe::new(
            addr("contract"),
            owner(),
            feed(),
            FundMeConfig { minimum_usd: 50 },
        );
        // 0.000000025 ETH at $2000 is $0.00005
        let err = fund_me
            .fund(addr("alice"), Wei::new(25_000_000_000))
            .unwrap_err();
        match err {
            FundMeError::InsufficientValue {
                usd_value, minimum, ..
            } => {
                assert_eq!(usd_value, 50_000_000_000_000);
                assert_eq!(minimum, 50 * WEI_PER_ETHER);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fund_me.funders().is_empty());
    }

    #[test]
    fn fund_updates_amount_funded_and_registry() {
        let mut fund_me = contract();
        let alice = addr("alice");
        let receipt = fund_me.fund(alice, Wei::from_ether(1)).unwrap();
        assert_eq!(receipt.total_funded, Wei::from_ether(1));
        assert_eq!(receipt.usd_value, 2000 * WEI_PER_ETHER);
        assert_eq!(fund_me.address_to_amount_funded(&alice), Wei::from_ether(1));
        assert_eq!(fund_me.funder(0).unwrap(), alice);
        assert_eq!(fund_me.funders(), &[alice]);
        assert_eq!(fund_me.balance(), Wei::from_ether(1));
    }

    #[test]
    fn repeat_funding_accumulates_and_logs_each_event() {
        let mut fund_me = contract();
        let alice = addr("alice");
        fund_me.fund(alice, Wei::from_ether(1)).unwrap();
        let receipt = fund_me.fund(alice, Wei::from_ether(2)).unwrap();
        assert_eq!(receipt.total_funded, Wei::from_ether(3));
        assert_eq!(fund_me.funders(), &[alice, alice]);
        assert_eq!(fund_me.address_to_amount_funded(&alice), Wei::from_ether(3));
        assert!(fund_me.verify_invariants().is_ok());
    }

    #[test]
    fn fund_respects_price_changes() {
        let feed = feed();
        let mut fund_me = FundMe::new(
            addr("contract"),
            owner(),
            feed.clone(),
            FundMeConfig::default(),
        );
        fund_me.fund(addr("alice"), Wei::new(WEI_PER_ETHER / 20)).unwrap();
        // at $100 the same 0.05 ETH is $5
        feed.update_answer(100 * 100_000_000);
        assert!(fund_me.fund(addr("alice"), Wei::new(WEI_PER_ETHER / 20)).is_err());
    }

    #[test]
    fn fund_rejects_held_balance_overflow() {
        let mut fund_me = contract();
        fund_me.fund(addr("alice"), Wei::new(u128::MAX - 1)).unwrap();
        let before = fund_me.state_digest();
        let err = fund_me.fund(addr("bob"), Wei::from_ether(1)).unwrap_err();
        assert!(matches!(err, FundMeError::BalanceOverflow { .. }));
        assert_eq!(fund_me.state_digest(), before);
    }

    #[test]
    fn get_funder_out_of_range() {
        let fund_me = funded(2);
        assert!(fund_me.funder(1).is_ok());
        assert_eq!(
            fund_me.funder(2),
            Err(FundMeError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn withdraw_gives_single_funder_balance_to_owner() {
        let mut fund_me = funded(1);
        let mut wallet = Wallet::default();
        let receipt = fund_me.withdraw(owner(), &mut wallet).unwrap();
        assert_eq!(receipt.amount, Wei::from_ether(1));
        assert_eq!(wallet.received, vec![(owner(), Wei::from_ether(1))]);
        assert_eq!(fund_me.balance(), Wei::ZERO);
    }

    #[test]
    fn withdraw_with_multiple_funders_resets_everything() {
        for strategy in [ResetStrategy::Direct, ResetStrategy::CopyThenBulkClear] {
            let mut fund_me = funded(10);
            let receipt = fund_me
                .withdraw_with(strategy, owner(), &mut Wallet::default())
                .unwrap();
            assert_eq!(receipt.amount, Wei::from_ether(10));
            assert_eq!(receipt.entries_cleared, 10);
            assert_eq!(fund_me.balance(), Wei::ZERO);
            assert!(matches!(
                fund_me.funder(0),
                Err(FundMeError::IndexOutOfRange { index: 0, len: 0 })
            ));
            for i in 0..10 {
                let funder = addr(&format!("funder-{i}"));
                assert_eq!(fund_me.address_to_amount_funded(&funder), Wei::ZERO);
            }
        }
    }

    #[test]
    fn only_owner_can_withdraw() {
        let mut fund_me = funded(3);
        let before = fund_me.state_digest();
        let mut wallet = Wallet::default();
        let attacker = addr("funder-1");
        let err = fund_me.withdraw(attacker, &mut wallet).unwrap_err();
        assert_eq!(err, FundMeError::NotOwner { caller: attacker });
        let err = fund_me.cheaper_withdraw(attacker, &mut wallet).unwrap_err();
        assert_eq!(err.code(), "FundMe__NotOwner");
        assert_eq!(fund_me.state_digest(), before);
        assert!(wallet.observed.is_empty());
    }

    #[test]
    fn failed_transfer_rolls_back_the_reset() {
        for strategy in [ResetStrategy::Direct, ResetStrategy::CopyThenBulkClear] {
            let mut fund_me = funded(4);
            let before = fund_me.state_digest();
            let mut wallet = Wallet {
                refuse: true,
                ..Default::default()
            };
            let err = fund_me.withdraw_with(strategy, owner(), &mut wallet).unwrap_err();
            assert!(matches!(
                err,
                FundMeError::TransferFailed { amount, .. } if amount == Wei::from_ether(4)
            ));
            assert_eq!(fund_me.state_digest(), before);
            assert_eq!(fund_me.funders().len(), 4);
            assert!(fund_me.verify_invariants().is_ok());
        }
    }

    #[test]
    fn reset_is_committed_before_transfer() {
        let mut fund_me = funded(5);
        let mut wallet = Wallet::default();
        fund_me.cheaper_withdraw(owner(), &mut wallet).unwrap();
        assert_eq!(wallet.observed, vec![(0, Wei::ZERO)]);
    }

    #[test]
    fn funding_resumes_after_withdrawal() {
        let mut fund_me = funded(2);
        fund_me.withdraw(owner(), &mut Wallet::default()).unwrap();
        let alice = addr("alice");
        fund_me.fund(alice, Wei::from_ether(1)).unwrap();
        assert_eq!(fund_me.funders(), &[alice]);
        assert_eq!(fund_me.balance(), Wei::from_ether(1));
    }

    #[test]
    fn withdraw_on_empty_contract_pays_nothing() {
        let mut fund_me = contract();
        let mut wallet = Wallet::default();
        let receipt = fund_me.withdraw(owner(), &mut wallet).unwrap();
        assert_eq!(receipt.amount, Wei::ZERO);
        assert_eq!(receipt.entries_cleared, 0);
    }

    #[test]
    fn cheaper_withdraw_reads_less_storage() {
        let mut direct = funded(10);
        let mut cheaper = funded(10);
        let a = direct.withdraw(owner(), &mut Wallet::default()).unwrap();
        let b = cheaper.cheaper_withdraw(owner(), &mut Wallet::default()).unwrap();
        assert!(b.storage.reads < a.storage.reads);
        assert!(b.storage.writes <= a.storage.writes);
    }

    #[test]
    fn state_round_trips_through_from_state() {
        let fund_me = funded(3);
        let restored = FundMe::from_state(fund_me.state(), fund_me.feed().clone()).unwrap();
        assert_eq!(restored.state_digest(), fund_me.state_digest());
    }

    #[test]
    fn from_state_rejects_mismatched_balance() {
        let mut state = funded(2).state();
        state.held = Wei::from_ether(5);
        assert!(matches!(
            FundMe::from_state(state, feed()),
            Err(StateError::BalanceMismatch { .. })
        ));
    }

    #[test]
    fn from_state_rejects_other_feed() {
        let state = funded(1).state();
        let other = Arc::new(MockV3Aggregator::new(addr("other-feed"), 8, PRICE));
        assert!(matches!(
            FundMe::from_state(state, other),
            Err(StateError::FeedMismatch { .. })
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Fund { funder: u8, milli_ether: u64 },
        Withdraw { by_owner: bool },
    }

    fn op_strategy() -> impl Strategy<Value = Vec<Op>> {
        proptest::collection::vec(
            prop_oneof![
                4 => (0u8..6, 0u64..3_000)
                    .prop_map(|(funder, milli_ether)| Op::Fund { funder, milli_ether }),
                1 => any::<bool>().prop_map(|by_owner| Op::Withdraw { by_owner }),
            ],
            0..40,
        )
    }

    fn milli(milli_ether: u64) -> Wei {
        Wei::new(u128::from(milli_ether) * WEI_PER_ETHER / 1000)
    }

    fn apply(fund_me: &mut FundMe, op: &Op, strategy: ResetStrategy) -> Result<(), FundMeError> {
        match op {
            Op::Fund { funder, milli_ether } => fund_me
                .fund(addr(&format!("prop-{funder}")), milli(*milli_ether))
                .map(|_| ()),
            Op::Withdraw { by_owner } => {
                let caller = if *by_owner { owner() } else { addr("prop-0") };
                fund_me
                    .withdraw_with(strategy, caller, &mut Wallet::default())
                    .map(|_| ())
            }
        }
    }

    proptest! {
        #[test]
        fn withdraw_variants_are_indistinguishable(
            ops in op_strategy(),
            final_owner in any::<bool>(),
        ) {
            let mut direct = contract();
            let mut cheaper = contract();
            for op in &ops {
                let a = apply(&mut direct, op, ResetStrategy::Direct);
                let b = apply(&mut cheaper, op, ResetStrategy::CopyThenBulkClear);
                prop_assert_eq!(a, b);
                prop_assert_eq!(direct.state_digest(), cheaper.state_digest());
            }
            let last = Op::Withdraw { by_owner: final_owner };
            let a = apply(&mut direct, &last, ResetStrategy::Direct);
            let b = apply(&mut cheaper, &last, ResetStrategy::CopyThenBulkClear);
            prop_assert_eq!(a, b);
            prop_assert_eq!(direct.state(), cheaper.state());
        }

        #[test]
        fn held_balance_tracks_accepted_amounts(ops in op_strategy()) {
            let mut fund_me = contract();
            let mut expected = Wei::ZERO;
            for op in &ops {
                let before = fund_me.balance();
                let result = apply(&mut fund_me, op, ResetStrategy::Direct);
                match (op, &result) {
                    (Op::Fund { milli_ether, .. }, Ok(())) => {
                        expected = expected.saturating_add(milli(*milli_ether));
                    }
                    (Op::Withdraw { .. }, Ok(())) => {
                        expected = Wei::ZERO;
                        prop_assert!(fund_me.funders().is_empty());
                        prop_assert_eq!(fund_me.book().contributor_count(), 0);
                    }
                    (_, Err(_)) => {
                        prop_assert_eq!(fund_me.balance(), before);
                    }
                }
                prop_assert_eq!(fund_me.balance(), expected);
                prop_assert!(fund_me.verify_invariants().is_ok());
            }
        }
    }
}
