use chain::ChainError;
use chain::adapter::near::NearRpc;

use serde_json::{Value, json};

pub const TITLE: &str = "Burrow accounts";

const BURROW_CONTRACT_ID: &str = "contract.main.burrow.near";

/// Number of accounts registered with the Burrow market at one height.
pub async fn compute_value(rpc: &NearRpc, block_height: u64) -> Result<Value, ChainError> {
    let num_accounts = rpc
        .view_call(block_height, BURROW_CONTRACT_ID, "get_num_accounts", &json!({}))
        .await?;

    Ok(json!({ "numAccounts": num_accounts }))
}
