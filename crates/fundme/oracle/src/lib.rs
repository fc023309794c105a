//! Price oracle surface for FundMe.
//!
//! The contract consumes exactly one capability from an oracle: the latest answer for
//! the native-unit/USD pair as a fixed-point integer. This crate defines that
//! capability ([`PriceFeed`]), the integer conversion used by the minimum-contribution
//! check ([`PriceConverter`]), and a round-based mock aggregator for development
//! chains and tests.

#![deny(unsafe_code)]

pub mod converter;
pub mod error;
pub mod mock;

use fundme_types::Address;
use std::sync::Arc;

pub use converter::PriceConverter;
pub use error::OracleError;
pub use mock::{AggregatorState, MockV3Aggregator, RoundData};

/// Read-only price source for the native unit in USD.
///
/// Implementations are assumed always available; an answer is a signed fixed-point
/// integer with [`PriceFeed::decimals`] fractional digits.
pub trait PriceFeed: Send + Sync {
    /// Address the feed is reachable at.
    fn address(&self) -> Address;

    /// Fractional digits of [`PriceFeed::latest_answer`].
    fn decimals(&self) -> u8;

    /// Latest native-unit price in USD, scaled by `10^decimals`.
    fn latest_answer(&self) -> i128;

    fn description(&self) -> String {
        "ETH / USD".to_string()
    }
}

impl<T: PriceFeed + ?Sized> PriceFeed for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn decimals(&self) -> u8 {
        (**self).decimals()
    }

    fn latest_answer(&self) -> i128 {
        (**self).latest_answer()
    }

    fn description(&self) -> String {
        (**self).description()
    }
}
