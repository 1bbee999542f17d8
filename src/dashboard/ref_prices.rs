use chain::ChainError;
use chain::adapter::near::NearRpc;
use chain::unit::Amount;

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const TITLE: &str = "REF prices";

const REF_FINANCE_CONTRACT_ID: &str = "v2.ref-finance.near";

/// Charted pools: label to REF pool id. Both quote against wNEAR with a
/// 6-decimal gap between the pool legs.
const REF_POOLS: [(&str, u64); 2] = [("REF/wNEAR", 79), ("BRRR/wNEAR", 3_474)];

#[derive(Deserialize)]
struct PoolView {
    amounts: Vec<Amount>,
}

/// Token prices implied by REF pool reserve ratios at one height.
pub async fn compute_value(rpc: &NearRpc, block_height: u64) -> Result<Value, ChainError> {
    let fetches = REF_POOLS.iter().map(|&(label, pool_id)| async move {
        let pool: PoolView = serde_json::from_value(
            rpc.view_call(
                block_height,
                REF_FINANCE_CONTRACT_ID,
                "get_pool",
                &json!({ "pool_id": pool_id }),
            )
            .await?,
        )
        .map_err(|e| ChainError::ParseError(e.to_string()))?;

        let base = pool.amounts.first().copied().unwrap_or(Amount::ZERO);
        let quote = pool.amounts.get(1).copied().unwrap_or(Amount::ZERO);
        if base == Amount::ZERO {
            return Err(ChainError::ParseError(format!(
                "pool {pool_id} has an empty base leg"
            )));
        }

        let price = quote.to_f64(0) / base.to_f64(0) / 1e6;
        Ok::<_, ChainError>((label, price))
    });

    let mut out = Map::new();
    for (label, price) in try_join_all(fetches).await? {
        out.insert(label.to_string(), json!(price));
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_view_parses_ref_response() {
        let raw = json!({
            "pool_kind": "SIMPLE_POOL",
            "token_account_ids": ["token.v2.ref-finance.near", "wrap.near"],
            "amounts": ["1786910671759961417619017764", "7181057697926871942929964482"],
            "total_fee": 30,
            "shares_total_supply": "3215952487584174478189064346"
        });

        let pool: PoolView = serde_json::from_value(raw).unwrap();
        assert_eq!(pool.amounts.len(), 2);

        let price = pool.amounts[1].to_f64(0) / pool.amounts[0].to_f64(0) / 1e6;
        assert!(price > 0.0);
    }
}
