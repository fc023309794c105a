use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;

/// Decimal places of the native value unit.
pub const NATIVE_DECIMALS: u32 = 18;

/// Sub-units in one whole native unit.
pub const WEI_PER_ETHER: u128 = 10u128.pow(NATIVE_DECIMALS);

/// An amount of native value, in indivisible sub-units.
///
/// Serialized as a decimal string so snapshots survive JSON consumers without
/// 128-bit integers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Wei(u128);

/// Failure to parse or combine value amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("invalid amount '{0}'")]
    Invalid(String),

    #[error("amount '{input}' has more than {max} fractional digits")]
    TooPrecise { input: String, max: u32 },

    #[error("amount '{0}' overflows 128 bits")]
    Overflow(String),
}

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub const fn new(amount: u128) -> Self {
        Self(amount)
    }

    /// Whole native units, e.g. `from_ether(1)` is 10^18 sub-units.
    pub const fn from_ether(units: u64) -> Self {
        Self(units as u128 * WEI_PER_ETHER)
    }

    /// Parse a decimal native-unit string such as `"0.1"` or `"25"`.
    pub fn parse_ether(input: &str) -> Result<Self, UnitError> {
        let trimmed = input.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(UnitError::Invalid(input.to_string()));
        }
        if fraction.len() > NATIVE_DECIMALS as usize {
            return Err(UnitError::TooPrecise {
                input: input.to_string(),
                max: NATIVE_DECIMALS,
            });
        }

        let overflow = || UnitError::Overflow(input.to_string());
        let whole_units: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let fraction_units: u128 = if fraction.is_empty() {
            0
        } else {
            let scale = 10u128.pow(NATIVE_DECIMALS - fraction.len() as u32);
            fraction.parse::<u128>().map_err(|_| overflow())? * scale
        };

        whole_units
            .checked_mul(WEI_PER_ETHER)
            .and_then(|wei| wei.checked_add(fraction_units))
            .map(Self)
            .ok_or_else(overflow)
    }

    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Wei) -> Wei {
        Self(self.0.saturating_add(other.0))
    }

    /// Decimal native-unit rendering with trailing zeros trimmed (`"0.1"`, `"2"`).
    pub fn format_ether(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let fraction = self.0 % WEI_PER_ETHER;
        if fraction == 0 {
            return whole.to_string();
        }
        let digits = format!("{:0width$}", fraction, width = NATIVE_DECIMALS as usize);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wei({})", self.0)
    }
}

impl From<u128> for Wei {
    fn from(amount: u128) -> Self {
        Self(amount)
    }
}

impl Sum for Wei {
    /// Saturating sum; callers comparing against a held balance treat saturation as a
    /// mismatch.
    fn sum<I: Iterator<Item = Wei>>(iter: I) -> Self {
        iter.fold(Wei::ZERO, Wei::saturating_add)
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse::<u128>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
