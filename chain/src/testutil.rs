use crate::Block;
use crate::adapter::{ChainError, ChainSource};

use std::collections::HashSet;

/// Deterministic chain for exercising the sampling core: one block every
/// `ms_per_block` starting at time 0 and height 0, with configurable
/// skipped heights and lookup failures.
pub struct SyntheticChain {
    pub ms_per_block: u64,
    pub head_height: u64,
    missing: HashSet<u64>,
    failing: HashSet<u64>,
}

impl SyntheticChain {
    pub fn new(ms_per_block: u64, head_height: u64) -> Self {
        SyntheticChain {
            ms_per_block,
            head_height,
            missing: HashSet::new(),
            failing: HashSet::new(),
        }
    }

    pub fn missing(mut self, heights: impl IntoIterator<Item = u64>) -> Self {
        self.missing.extend(heights);
        self
    }

    pub fn failing(mut self, heights: impl IntoIterator<Item = u64>) -> Self {
        self.failing.extend(heights);
        self
    }

    pub fn block_at(&self, height: u64) -> Block {
        Block {
            height,
            timestamp_nanos: height * self.ms_per_block * 1_000_000,
        }
    }
}

impl ChainSource for SyntheticChain {
    async fn current_height(&self) -> Result<u64, ChainError> {
        Ok(self.head_height)
    }

    async fn block_by_height(&self, height: u64) -> Result<Option<Block>, ChainError> {
        if self.failing.contains(&height) {
            return Err(ChainError::RpcError(format!("injected failure at {height}")));
        }
        if height > self.head_height || self.missing.contains(&height) {
            return Ok(None);
        }
        Ok(Some(self.block_at(height)))
    }
}
