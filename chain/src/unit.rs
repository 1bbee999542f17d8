use crate::adapter::ChainError;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw on-chain token amount in the token's smallest unit.
///
/// Contracts return these as decimal strings since balances exceed what a
/// JSON number can carry (NEAR itself uses 24 decimals). Display math
/// happens in `f64` after scaling; the precision loss is acceptable for
/// charting, mirroring how exchange feeds round prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Accepts both encodings contracts use: a decimal string or a plain
    /// JSON number.
    pub fn from_json(value: &Value) -> Result<Self, ChainError> {
        match value {
            Value::String(s) => s
                .parse::<u128>()
                .map(Amount)
                .map_err(|e| ChainError::ParseError(format!("amount {s:?}: {e}"))),
            Value::Number(n) => n
                .as_u64()
                .map(|v| Amount(u128::from(v)))
                .ok_or_else(|| ChainError::ParseError(format!("amount out of range: {n}"))),
            other => Err(ChainError::ParseError(format!(
                "expected amount as string or number, got {other}"
            ))),
        }
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Scales the raw amount down by `decimals` into a display value.
    pub fn to_f64(self, decimals: u32) -> f64 {
        self.0 as f64 / 10f64.powi(decimals as i32)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Amount::from_json(&value).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn de_string_to_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    s.parse::<u128>().map_err(serde::de::Error::custom)
}

/// Price-oracle quote: `multiplier / 10^decimals` is the USD price of one
/// smallest token unit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OraclePrice {
    pub multiplier: Amount,
    pub decimals: u32,
}

impl OraclePrice {
    /// USD value of one raw unit of the asset.
    pub fn per_raw_unit(&self) -> f64 {
        self.multiplier.to_f64(self.decimals)
    }
}
