//! FundMe ledger and withdrawal engine.
//!
//! A custodial pool that accepts value from anyone above a USD-denominated minimum,
//! keeps an ordered registry of funding events alongside a per-address contribution
//! ledger, and lets a single fixed owner withdraw the whole pool.
//!
//! Invariants maintained between calls:
//! 1. The held balance equals the sum of the contribution ledger.
//! 2. Every address with a nonzero contribution appears in the funder registry, and
//!    every registry entry has a nonzero contribution.
//! 3. After a successful withdrawal the registry is empty, every contribution is
//!    zero, and the held balance is zero.
//! 4. The owner never changes.
//!
//! Withdrawal commits the reset before invoking the [`ValueTransfer`] primitive and
//! rolls it back if the transfer fails, so no caller ever observes an emptied ledger
//! with an unpaid balance.

#![deny(unsafe_code)]

pub mod book;
pub mod config;
pub mod error;
pub mod fund_me;
pub mod reset;
pub mod state;
pub mod storage;

pub use book::FunderBook;
pub use config::FundMeConfig;
pub use error::{FailureKind, FundMeError, StateError, TransferError};
pub use fund_me::{FundMe, FundReceipt, ValueTransfer, WithdrawReceipt};
pub use reset::ResetStrategy;
pub use state::FundMeState;
pub use storage::{GasSchedule, MeteredBook, StorageMeter};
