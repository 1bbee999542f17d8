use crate::Block;
use crate::adapter::ChainSource;

/// Consecutive heights tried before concluding no block is reachable.
const PROBE_WINDOW: u64 = 5;

/// Finds the nearest existing block at or after `approx_height`.
///
/// Chains skip heights, so a lookup miss (or a lookup error, which archival
/// nodes also produce for absent heights) just moves the probe forward.
/// `None` means the whole window came up empty. For in-range inputs that
/// signals the search boundary was exceeded, and callers treat it as a
/// failed sample rather than retrying.
pub async fn locate_block<S: ChainSource>(source: &S, approx_height: u64) -> Option<Block> {
    let limit = approx_height.saturating_add(PROBE_WINDOW);

    for height in approx_height..limit {
        match source.block_by_height(height).await {
            Ok(Some(block)) => return Some(block),
            Ok(None) => {}
            Err(err) => {
                // probably the block doesn't exist at this height
                log::debug!("block lookup at {height} failed: {err}");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SyntheticChain;

    #[tokio::test]
    async fn skips_missing_heights_and_returns_next_available() {
        let chain = SyntheticChain::new(900, 1_000).missing([10, 11, 12]);

        let block = locate_block(&chain, 10).await.unwrap();
        assert_eq!(block.height, 13);
    }

    #[tokio::test]
    async fn returns_block_at_exact_height_when_present() {
        let chain = SyntheticChain::new(900, 1_000);

        let block = locate_block(&chain, 42).await.unwrap();
        assert_eq!(block.height, 42);
        assert!((block.time_ms() - 42.0 * 900.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn gives_up_after_probe_window() {
        let chain = SyntheticChain::new(900, 1_000).missing([20, 21, 22, 23, 24]);

        assert!(locate_block(&chain, 20).await.is_none());
    }

    #[tokio::test]
    async fn lookup_errors_are_treated_as_missing_blocks() {
        let chain = SyntheticChain::new(900, 1_000).failing([30, 31]);

        let block = locate_block(&chain, 30).await.unwrap();
        assert_eq!(block.height, 32);
    }

    #[tokio::test]
    async fn idempotent_against_unchanged_source() {
        let chain = SyntheticChain::new(900, 1_000).missing([7]);

        let first = locate_block(&chain, 7).await.unwrap();
        let second = locate_block(&chain, 7).await.unwrap();
        assert_eq!(first, second);
    }
}
