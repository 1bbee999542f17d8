use super::oracle;

use chain::ChainError;
use chain::adapter::near::NearRpc;
use chain::unit::Amount;

use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const TITLE: &str = "Burrow TVL";

const BURROW_CONTRACT_ID: &str = "contract.main.burrow.near";
const ORACLE_CONTRACT_ID: &str = "priceoracle.near";

fn token_name(asset_id: &str) -> Option<&'static str> {
    Some(match asset_id {
        "a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near" => "USDC",
        "dac17f958d2ee523a2206206994597c13d831ec7.factory.bridge.near" => "USDT",
        "6b175474e89094c44da98b954eedeac495271d0f.factory.bridge.near" => "DAI",
        "aurora" => "ETH",
        "2260fac5e5542a773aa44fbcfedf7c193bc2c599.factory.bridge.near" => "BTC",
        "wrap.near" => "wNEAR",
        "meta-pool.near" => "STNEAR",
        "linear-protocol.near" => "LINEAR",
        "usn" => "USN",
        "aaaaaa20d9e0e2461697782ef11675f668207961.factory.bridge.near" => "AURORA",
        "token.burrow.near" => "BRRR",
        "meta-token.near" => "META",
        _ => return None,
    })
}

fn token_decimals(asset_id: &str) -> u32 {
    match asset_id {
        "a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near"
        | "dac17f958d2ee523a2206206994597c13d831ec7.factory.bridge.near" => 6,
        "6b175474e89094c44da98b954eedeac495271d0f.factory.bridge.near"
        | "aurora"
        | "usn"
        | "aaaaaa20d9e0e2461697782ef11675f668207961.factory.bridge.near"
        | "token.burrow.near" => 18,
        "2260fac5e5542a773aa44fbcfedf7c193bc2c599.factory.bridge.near" => 8,
        "wrap.near" | "meta-pool.near" | "linear-protocol.near" | "meta-token.near" => 24,
        _ => 0,
    }
}

#[derive(Deserialize)]
struct AssetView {
    supplied: AssetPoolView,
    borrowed: AssetPoolView,
    reserved: Amount,
    config: AssetConfigView,
}

#[derive(Deserialize)]
struct AssetPoolView {
    balance: Amount,
}

#[derive(Deserialize)]
struct AssetConfigView {
    extra_decimals: u32,
}

/// Per-token deposit/borrow totals of the Burrow market at one height.
///
/// The market stores balances with `extra_decimals` of added precision; the
/// oracle multiplier already folds in the token's own decimals, so USD legs
/// come straight from the extra-decimals-scaled amount.
pub async fn compute_value(rpc: &NearRpc, block_height: u64) -> Result<Value, ChainError> {
    let assets: Vec<(String, AssetView)> = serde_json::from_value(
        rpc.view_call(block_height, BURROW_CONTRACT_ID, "get_assets_paged", &json!({}))
            .await?,
    )
    .map_err(|e| ChainError::ParseError(e.to_string()))?;

    let asset_ids: Vec<&str> = assets.iter().map(|(id, _)| id.as_str()).collect();
    let prices =
        oracle::fetch_price_data(rpc, block_height, ORACLE_CONTRACT_ID, &asset_ids).await?;

    let mut out = Map::new();
    for (asset_id, asset) in &assets {
        // assets the oracle has never listed are excluded; a listed asset
        // with no current quote still shows up with zero USD legs
        let Some(quote) = prices.get(asset_id) else {
            continue;
        };
        let price_mul = quote.map_or(0.0, |p| p.per_raw_unit());

        let deposit = asset
            .supplied
            .balance
            .saturating_add(asset.reserved)
            .to_f64(asset.config.extra_decimals);
        let borrow = asset.borrowed.balance.to_f64(asset.config.extra_decimals);

        let scale = 10f64.powi(token_decimals(asset_id) as i32);
        let label = token_name(asset_id)
            .map(str::to_owned)
            .unwrap_or_else(|| asset_id.clone());

        out.insert(
            label,
            json!({
                "deposit": deposit / scale,
                "depositUsd": deposit * price_mul,
                "borrow": borrow / scale,
                "borrowUsd": borrow * price_mul,
            }),
        );
    }

    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_view_parses_market_response() {
        let raw = json!({
            "supplied": { "shares": "901409770079676745519181", "balance": "902983777528920023021982" },
            "borrowed": { "shares": "615517537154144794139802", "balance": "626468946418569604558203" },
            "reserved": "5196565107596500000000",
            "last_update_timestamp": "1651624973046207738",
            "config": {
                "reserve_ratio": 2500,
                "target_utilization": 8000,
                "extra_decimals": 12,
                "can_deposit": true
            }
        });

        let view: AssetView = serde_json::from_value(raw).unwrap();
        assert_eq!(view.config.extra_decimals, 12);
        assert_eq!(view.reserved, Amount(5_196_565_107_596_500_000_000));
        assert!(view.supplied.balance > view.borrowed.balance);
    }

    #[test]
    fn bridged_tokens_resolve_to_short_names() {
        assert_eq!(token_name("wrap.near"), Some("wNEAR"));
        assert_eq!(
            token_name("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near"),
            Some("USDC")
        );
        assert_eq!(token_name("some-new-token.near"), None);

        assert_eq!(token_decimals("wrap.near"), 24);
        assert_eq!(token_decimals("some-new-token.near"), 0);
    }
}
