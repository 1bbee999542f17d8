use super::oracle;

use chain::ChainError;
use chain::adapter::near::NearRpc;
use chain::unit::{Amount, OraclePrice};

use serde::Deserialize;
use serde_json::{Value, json};

use std::collections::HashMap;

pub const TITLE: &str = "USN Treasury data";

const USN_CONTRACT_ID: &str = "usn";
const WNEAR_CONTRACT_ID: &str = "wrap.near";
const USDT_CONTRACT_ID: &str = "dac17f958d2ee523a2206206994597c13d831ec7.factory.bridge.near";
const ORACLE_CONTRACT_ID: &str = "priceoracle.near";
const REF_FINANCE_CONTRACT_ID: &str = "v2.ref-finance.near";
const USN_STABLE_POOL_ID: u64 = 3020;

const NEAR_DECIMALS: u32 = 24;
const USN_DECIMALS: u32 = 18;

#[derive(Deserialize)]
struct StablePoolView {
    /// Pool legs in pool order: USN first, USDT second.
    amounts: Vec<Amount>,
    shares_total_supply: Amount,
}

/// USN treasury composition at one height: total supply plus the treasury's
/// NEAR/USDT/USN holdings across the account itself, REF deposits, and its
/// share of the USN/USDT stable pool.
pub async fn compute_value(rpc: &NearRpc, block_height: u64) -> Result<Value, ChainError> {
    let account = rpc.view_account(block_height, USN_CONTRACT_ID).await?;
    let near_balance = Amount(account.amount);

    let total_supply = Amount::from_json(
        &rpc.view_call(block_height, USN_CONTRACT_ID, "ft_total_supply", &json!({}))
            .await?,
    )?;

    let ref_deposits: HashMap<String, Amount> = serde_json::from_value(
        rpc.view_call(
            block_height,
            REF_FINANCE_CONTRACT_ID,
            "get_deposits",
            &json!({ "account_id": USN_CONTRACT_ID }),
        )
        .await?,
    )
    .map_err(|e| ChainError::ParseError(e.to_string()))?;

    let pool_shares = Amount::from_json(
        &rpc.view_call(
            block_height,
            REF_FINANCE_CONTRACT_ID,
            "get_pool_shares",
            &json!({ "pool_id": USN_STABLE_POOL_ID, "account_id": USN_CONTRACT_ID }),
        )
        .await?,
    )?;

    let stable_pool: StablePoolView = serde_json::from_value(
        rpc.view_call(
            block_height,
            REF_FINANCE_CONTRACT_ID,
            "get_stable_pool",
            &json!({ "pool_id": USN_STABLE_POOL_ID }),
        )
        .await?,
    )
    .map_err(|e| ChainError::ParseError(e.to_string()))?;

    let total_shares = stable_pool.shares_total_supply.to_f64(0);
    if total_shares <= 0.0 {
        return Err(ChainError::ParseError(format!(
            "stable pool {USN_STABLE_POOL_ID} has no outstanding shares"
        )));
    }
    let pool_share = pool_shares.to_f64(0) / total_shares;

    let deposit_of = |contract_id: &str| {
        ref_deposits
            .get(contract_id)
            .copied()
            .unwrap_or(Amount::ZERO)
            .to_f64(0)
    };
    let pool_leg = |index: usize| {
        stable_pool
            .amounts
            .get(index)
            .copied()
            .unwrap_or(Amount::ZERO)
            .to_f64(0)
    };

    let owned_usn = pool_leg(0) * pool_share + deposit_of(USN_CONTRACT_ID);
    let owned_usdt = pool_leg(1) * pool_share + deposit_of(USDT_CONTRACT_ID);
    let owned_near = near_balance.to_f64(0) + deposit_of(WNEAR_CONTRACT_ID);

    let prices = oracle::fetch_price_data(
        rpc,
        block_height,
        ORACLE_CONTRACT_ID,
        &[WNEAR_CONTRACT_ID, USDT_CONTRACT_ID, USN_CONTRACT_ID],
    )
    .await?;
    let price_of = |contract_id: &str| -> Option<f64> {
        prices
            .get(contract_id)
            .copied()
            .flatten()
            .map(|p: OraclePrice| p.per_raw_unit())
    };

    // the oracle rarely quotes USN itself; assume the peg when it doesn't
    let usn_peg = 10f64.powi(-(USN_DECIMALS as i32));

    let near_usd = owned_near * price_of(WNEAR_CONTRACT_ID).unwrap_or(0.0);
    let usdt_usd = owned_usdt * price_of(USDT_CONTRACT_ID).unwrap_or(0.0);
    let usn_usd = owned_usn * price_of(USN_CONTRACT_ID).unwrap_or(usn_peg);

    Ok(json!({
        "USN total supply": total_supply.to_f64(USN_DECIMALS),
        "Treasury balance in USD": near_usd + usdt_usd + usn_usd,
        "NEAR balance in USD": near_usd,
        "USDT balance in USD": usdt_usd,
        "USN balance in USD": usn_usd,
        "NEAR balance": owned_near / 10f64.powi(NEAR_DECIMALS as i32),
    }))
}
