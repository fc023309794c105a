use fundme_types::WEI_PER_ETHER;
use serde::{Deserialize, Serialize};

/// Contract parameters fixed at construction.
///
/// The native unit always carries 18 decimals; oracle decimals come from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FundMeConfig {
    /// Minimum contribution in whole USD.
    pub minimum_usd: u64,
}

impl FundMeConfig {
    /// Minimum contribution in the 18-decimal USD unit produced by price conversion.
    pub fn minimum_usd_scaled(&self) -> u128 {
        u128::from(self.minimum_usd).saturating_mul(WEI_PER_ETHER)
    }
}

impl Default for FundMeConfig {
    fn default() -> Self {
        Self { minimum_usd: 50 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_minimum_is_fifty_dollars() {
        let config = FundMeConfig::default();
        assert_eq!(config.minimum_usd_scaled(), 50 * 10u128.pow(18));
    }

    #[test]
    fn threshold_uses_native_precision() {
        let config = FundMeConfig { minimum_usd: 5 };
        assert_eq!(config.minimum_usd_scaled(), 5 * WEI_PER_ETHER);
    }

    #[test]
    fn decimals_are_not_configurable() {
        let parsed: Result<FundMeConfig, _> =
            serde_json::from_str(r#"{"minimum_usd":50,"native_decimals":6}"#);
        assert!(parsed.is_err());
    }
}
