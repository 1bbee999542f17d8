use chain::ChainError;
use chain::adapter::near::NearRpc;
use chain::unit::OraclePrice;

use serde::Deserialize;
use serde_json::json;

use std::collections::HashMap;

#[derive(Deserialize)]
struct PriceDataView {
    prices: Vec<AssetPriceView>,
}

#[derive(Deserialize)]
struct AssetPriceView {
    asset_id: String,
    price: Option<OraclePrice>,
}

/// Fetches the oracle's quotes for `asset_ids` at a historical height.
///
/// Every requested asset gets an entry; assets the oracle currently has no
/// quote for map to `None` (the oracle keeps listing them with a null
/// price), and assets the oracle doesn't know at all are simply absent.
pub(super) async fn fetch_price_data(
    rpc: &NearRpc,
    block_height: u64,
    oracle_contract_id: &str,
    asset_ids: &[&str],
) -> Result<HashMap<String, Option<OraclePrice>>, ChainError> {
    let raw = rpc
        .view_call(
            block_height,
            oracle_contract_id,
            "get_price_data",
            &json!({ "asset_ids": asset_ids }),
        )
        .await?;

    let data: PriceDataView =
        serde_json::from_value(raw).map_err(|e| ChainError::ParseError(e.to_string()))?;

    Ok(data
        .prices
        .into_iter()
        .map(|entry| (entry.asset_id, entry.price))
        .collect())
}
