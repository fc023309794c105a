use fundme_types::Wei;
use tracing::{debug, warn};

use crate::PriceFeed;

/// Integer conversion from native value to its USD equivalent.
///
/// `usd = amount * answer / 10^decimals`. With an 18-decimal native unit and an
/// 8-decimal feed, the result is USD with 18 decimals, directly comparable against a
/// threshold expressed in the same unit.
pub struct PriceConverter;

impl PriceConverter {
    /// Latest positive answer of the feed; non-positive answers read as zero.
    pub fn price(feed: &dyn PriceFeed) -> u128 {
        let answer = feed.latest_answer();
        if answer <= 0 {
            warn!(
                feed = %feed.address(),
                answer = answer,
                "Price feed returned a non-positive answer"
            );
            return 0;
        }
        answer as u128
    }

    /// USD equivalent of `amount` at the feed's latest answer.
    pub fn conversion_rate(amount: Wei, feed: &dyn PriceFeed) -> u128 {
        let price = Self::price(feed);
        let usd = Self::convert(amount, price, feed.decimals());
        debug!(
            amount = %amount,
            price = price,
            usd = usd,
            "Converted native amount to USD"
        );
        usd
    }

    /// Pure conversion at an explicit price.
    ///
    /// The product saturates at `u128::MAX` instead of wrapping: a saturated product
    /// still divides to a value above any threshold below `u128::MAX / 10^decimals`.
    pub fn convert(amount: Wei, price: u128, decimals: u8) -> u128 {
        let product = amount.as_u128().saturating_mul(price);
        match 10u128.checked_pow(u32::from(decimals)) {
            Some(scale) => product / scale,
            None => 0,
        }
    }
}
