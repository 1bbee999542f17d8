use super::{ChainError, ChainSource};
use crate::{Block, de_string_to_u64, limiter, unit::de_string_to_u128};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const MAINNET_ARCHIVAL_DOMAIN: &str = "https://archival-rpc.mainnet.near.org";
pub const TESTNET_ARCHIVAL_DOMAIN: &str = "https://archival-rpc.testnet.near.org";

// Public archival nodes throttle aggressively; stay under the documented
// 600 req/min per IP.
const RPC_LIMIT: usize = 550;
const RPC_WINDOW: Duration = Duration::from_secs(60);

static RPC_LIMITER: LazyLock<Mutex<limiter::FixedWindowBucket>> =
    LazyLock::new(|| Mutex::new(limiter::FixedWindowBucket::new(RPC_LIMIT, RPC_WINDOW)));

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// JSON-RPC 2.0 client against a NEAR archival node.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared, so one
/// instance can serve the sampler's whole worker pool concurrently.
#[derive(Debug, Clone)]
pub struct NearRpc {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorView>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorView {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cause: Option<RpcErrorCause>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorCause {
    #[serde(default)]
    name: Option<String>,
}

impl RpcErrorView {
    /// "No such block" comes back as a handler error, in two historical
    /// shapes: a structured `cause.name == "UNKNOWN_BLOCK"` or a legacy
    /// `data` string mentioning a DB miss.
    fn is_unknown_block(&self) -> bool {
        if let Some(cause) = &self.cause
            && cause.name.as_deref() == Some("UNKNOWN_BLOCK")
        {
            return true;
        }
        matches!(&self.data, Some(Value::String(s)) if s.contains("DB Not Found"))
    }

    fn describe(&self) -> String {
        let name = self.name.as_deref().unwrap_or("UNKNOWN");
        match &self.message {
            Some(msg) => format!("{name}: {msg}"),
            None => name.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct BlockView {
    header: BlockHeaderView,
}

#[derive(Deserialize)]
struct BlockHeaderView {
    height: u64,
    #[serde(rename = "timestamp_nanosec", deserialize_with = "de_string_to_u64")]
    timestamp_nanos: u64,
}

impl From<BlockView> for Block {
    fn from(view: BlockView) -> Self {
        Block {
            height: view.header.height,
            timestamp_nanos: view.header.timestamp_nanos,
        }
    }
}

/// Account state at a historical height, as returned by a `view_account`
/// query. `amount` is the liquid balance in the chain's smallest unit.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountView {
    #[serde(deserialize_with = "de_string_to_u128")]
    pub amount: u128,
    #[serde(deserialize_with = "de_string_to_u128")]
    pub locked: u128,
    pub storage_usage: u64,
}

#[derive(Deserialize)]
struct CallResultView {
    result: Vec<u8>,
}

impl NearRpc {
    pub fn new(endpoint: impl Into<String>) -> Self {
        NearRpc {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn mainnet_archival() -> Self {
        Self::new(MAINNET_ARCHIVAL_DOMAIN)
    }

    pub fn testnet_archival() -> Self {
        Self::new(TESTNET_ARCHIVAL_DOMAIN)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, method: &str, params: Value) -> Result<Option<Value>, ChainError> {
        limiter::acquire(&RPC_LIMITER).await;

        let body = json!({
            "jsonrpc": "2.0",
            "id": REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: RpcEnvelope = response.json().await?;

        if let Some(error) = envelope.error {
            if error.is_unknown_block() {
                return Ok(None);
            }
            return Err(ChainError::RpcError(error.describe()));
        }

        envelope
            .result
            .map(Some)
            .ok_or_else(|| ChainError::ParseError("RPC response without result".to_string()))
    }

    /// Block at the exact height, `None` when the chain skipped it.
    pub async fn fetch_block(&self, height: u64) -> Result<Option<Block>, ChainError> {
        let result = self.call("block", json!({ "block_id": height })).await?;

        match result {
            Some(value) => {
                let view: BlockView = serde_json::from_value(value)
                    .map_err(|e| ChainError::ParseError(e.to_string()))?;
                Ok(Some(view.into()))
            }
            None => Ok(None),
        }
    }

    /// Height of the latest final block.
    pub async fn fetch_current_height(&self) -> Result<u64, ChainError> {
        let result = self
            .call("block", json!({ "finality": "final" }))
            .await?
            .ok_or_else(|| ChainError::RpcError("final block reported unknown".to_string()))?;

        let view: BlockView =
            serde_json::from_value(result).map_err(|e| ChainError::ParseError(e.to_string()))?;
        Ok(view.header.height)
    }

    /// Read-only contract call evaluated at a historical height. The
    /// contract's returned bytes are decoded as JSON.
    pub async fn view_call(
        &self,
        height: u64,
        account_id: &str,
        method_name: &str,
        args: &Value,
    ) -> Result<Value, ChainError> {
        let args_base64 = BASE64.encode(
            serde_json::to_vec(args).map_err(|e| ChainError::InvalidRequest(e.to_string()))?,
        );

        let result = self
            .call(
                "query",
                json!({
                    "request_type": "call_function",
                    "block_id": height,
                    "account_id": account_id,
                    "method_name": method_name,
                    "args_base64": args_base64,
                }),
            )
            .await?
            .ok_or_else(|| {
                ChainError::RpcError(format!("view call {account_id}.{method_name}: unknown block {height}"))
            })?;

        let call: CallResultView =
            serde_json::from_value(result).map_err(|e| ChainError::ParseError(e.to_string()))?;

        serde_json::from_slice(&call.result).map_err(|e| {
            ChainError::ParseError(format!("{account_id}.{method_name} returned invalid JSON: {e}"))
        })
    }

    /// Account state at a historical height.
    pub async fn view_account(
        &self,
        height: u64,
        account_id: &str,
    ) -> Result<AccountView, ChainError> {
        let result = self
            .call(
                "query",
                json!({
                    "request_type": "view_account",
                    "block_id": height,
                    "account_id": account_id,
                }),
            )
            .await?
            .ok_or_else(|| {
                ChainError::RpcError(format!("view account {account_id}: unknown block {height}"))
            })?;

        serde_json::from_value(result).map_err(|e| ChainError::ParseError(e.to_string()))
    }
}

impl ChainSource for NearRpc {
    async fn current_height(&self) -> Result<u64, ChainError> {
        self.fetch_current_height().await
    }

    async fn block_by_height(&self, height: u64) -> Result<Option<Block>, ChainError> {
        self.fetch_block(height).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_view_parses_archival_header() {
        let raw = json!({
            "author": "validator.near",
            "header": {
                "height": 62_130_112,
                "timestamp": 1_648_425_611_178_755_600u64,
                "timestamp_nanosec": "1648425611178755600",
                "prev_hash": "9Y3..."
            },
            "chunks": []
        });

        let view: BlockView = serde_json::from_value(raw).unwrap();
        let block: Block = view.into();
        assert_eq!(block.height, 62_130_112);
        assert_eq!(block.timestamp_nanos, 1_648_425_611_178_755_600);
        assert!((block.time_ms() - 1_648_425_611_178.755_6).abs() < 1.0);
    }

    #[test]
    fn unknown_block_detected_in_both_error_shapes() {
        let structured: RpcErrorView = serde_json::from_value(json!({
            "name": "HANDLER_ERROR",
            "cause": { "name": "UNKNOWN_BLOCK", "info": {} }
        }))
        .unwrap();
        assert!(structured.is_unknown_block());

        let legacy: RpcErrorView = serde_json::from_value(json!({
            "code": -32_000,
            "data": "DB Not Found Error: BLOCK HEIGHT: 10 \n Cause: Unknown",
            "message": "Server error"
        }))
        .unwrap();
        assert!(legacy.is_unknown_block());

        let other: RpcErrorView = serde_json::from_value(json!({
            "name": "REQUEST_VALIDATION_ERROR",
            "cause": { "name": "PARSE_ERROR" }
        }))
        .unwrap();
        assert!(!other.is_unknown_block());
    }

    #[test]
    fn account_view_parses_balance_strings() {
        let view: AccountView = serde_json::from_value(json!({
            "amount": "110718114569008536923157089",
            "locked": "0",
            "code_hash": "11111111111111111111111111111111",
            "storage_usage": 1_820_338,
            "storage_paid_at": 0
        }))
        .unwrap();

        assert_eq!(view.amount, 110_718_114_569_008_536_923_157_089);
        assert_eq!(view.locked, 0);
        assert_eq!(view.storage_usage, 1_820_338);
    }
}
