use super::oracle;

use chain::ChainError;
use chain::adapter::near::NearRpc;

use serde_json::{Map, Value, json};

pub const TITLE: &str = "Price oracle (testnet)";

const ORACLE_CONTRACT_ID: &str = "priceoracle.testnet";

/// Charted oracle assets: contract id to display name. The `#3600` variant
/// is the one-hour TWAP feed of the same asset.
const TRACKED_ASSETS: [(&str, &str); 9] = [
    ("usdc.fakes.testnet", "USDC"),
    ("usdt.fakes.testnet", "USDT"),
    ("dai.fakes.testnet", "DAI"),
    ("aurora", "ETH"),
    ("wbtc.fakes.testnet", "BTC"),
    ("wrap.testnet", "wNEAR"),
    ("wrap.testnet#3600", "wNEAR#3600"),
    ("usdn.testnet", "USN"),
    ("aurora.fakes.testnet", "AURORA"),
];

/// Testnet oracle quotes with 4 fraction digits; TWAP feeds carry an extra
/// scale on top.
fn extra_divide(asset_id: &str) -> f64 {
    match asset_id {
        "wrap.testnet#3600" => 10_000.0,
        _ => 1.0,
    }
}

/// Raw oracle quotes for the tracked testnet assets at one height. Assets
/// without a current quote chart as null.
pub async fn compute_value(rpc: &NearRpc, block_height: u64) -> Result<Value, ChainError> {
    let asset_ids: Vec<&str> = TRACKED_ASSETS.iter().map(|&(id, _)| id).collect();
    let prices =
        oracle::fetch_price_data(rpc, block_height, ORACLE_CONTRACT_ID, &asset_ids).await?;

    let mut out = Map::new();
    for &(asset_id, name) in &TRACKED_ASSETS {
        let value = prices.get(asset_id).copied().flatten().map(|price| {
            price.multiplier.to_f64(4) / extra_divide(asset_id)
        });
        out.insert(name.to_string(), json!(value));
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twap_feed_carries_the_extra_scale() {
        assert!((extra_divide("wrap.testnet#3600") - 10_000.0).abs() < f64::EPSILON);
        assert!((extra_divide("wrap.testnet") - 1.0).abs() < f64::EPSILON);
    }
}
