use crate::Block;

pub mod near;

#[derive(thiserror::Error, Debug)]
pub enum ChainError {
    #[error("{0}")]
    FetchError(#[from] reqwest::Error),
    #[error("Rpc: {0}")]
    RpcError(String),
    #[error("Parsing: {0}")]
    ParseError(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ChainError {
    pub fn to_user_message(&self) -> &'static str {
        match self {
            ChainError::FetchError(err) => {
                log::error!("Chain fetch error: {err}");
                "Network error while contacting the chain RPC."
            }
            ChainError::RpcError(err) => {
                log::error!("Chain RPC error: {err}");
                "The RPC node rejected the request. Check logs for details."
            }
            ChainError::ParseError(err) => {
                log::error!("Chain parse error: {err}");
                "Unexpected response from the chain RPC. Check logs for details."
            }
            ChainError::InvalidRequest(err) => {
                log::error!("Chain invalid request: {err}");
                "Invalid request made to the chain RPC. Check logs for details."
            }
        }
    }
}

/// The archival data source the sampling core runs against.
///
/// `block_by_height` answers `Ok(None)` for heights that have no committed
/// block (skipped slots); only transport or node failures surface as errors.
pub trait ChainSource: Sync {
    fn current_height(&self) -> impl Future<Output = Result<u64, ChainError>> + Send;

    fn block_by_height(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<Option<Block>, ChainError>> + Send;
}
