use crate::Block;
use crate::adapter::ChainSource;
use crate::locate::locate_block;
use crate::sampler::{SamplerConfig, SamplingError};

/// Refinement iterations before settling for the best-effort left bound.
const RESOLVE_ITERATIONS: usize = 5;

/// Finds the block whose timestamp is closest to `target_time_ms`, searching
/// backward from `current_block`.
///
/// The left bound starts at a linear extrapolation assuming the optimistic
/// block time, capped at `max_lookback_blocks` and clamped at height 0 (a
/// target before genesis must not underflow). Each iteration interpolates
/// the target height between the bounds proportionally to where the target
/// time falls, and returns as soon as a located block lands within
/// `tolerance_ms` of the target.
///
/// Exhausting the iteration budget is not an error: the block at the final
/// left bound is returned as the best available approximation.
pub async fn resolve_start_block<S: ChainSource>(
    source: &S,
    target_time_ms: f64,
    current_block: &Block,
    cfg: &SamplerConfig,
) -> Result<Block, SamplingError> {
    let mut height_right = current_block.height;
    let mut time_right = current_block.time_ms();

    let lookback_blocks = ((time_right - target_time_ms) / cfg.optimistic_ms_per_block).ceil();
    let left_guess = if lookback_blocks <= 0.0 {
        // the chain head is already at or before the target time
        height_right
    } else {
        height_right.saturating_sub((lookback_blocks as u64).min(cfg.max_lookback_blocks))
    };

    let left = locate_block(source, left_guess)
        .await
        .ok_or(SamplingError::BlockNotFound(left_guess))?;
    let mut height_left = left.height;
    let mut time_left = left.time_ms();

    for iteration in 0..RESOLVE_ITERATIONS {
        let height_span = height_right as f64 - height_left as f64;
        let time_span = time_right - time_left;
        if height_span <= 0.0 || time_span <= 0.0 {
            break;
        }

        let guess = height_left as f64
            + (height_span / time_span * (target_time_ms - time_left)).round();
        let guess = guess.max(0.0) as u64;

        let block = locate_block(source, guess)
            .await
            .ok_or(SamplingError::BlockNotFound(guess))?;
        let block_time = block.time_ms();

        let proximity = (target_time_ms - block_time).abs();
        log::debug!(
            "start block iter #{iteration}: time proximity {:.2} sec",
            proximity / 1e3
        );
        if proximity < cfg.tolerance_ms {
            return Ok(block);
        }

        if block_time > target_time_ms {
            height_right = block.height;
            time_right = block_time;
        } else {
            height_left = block.height;
            time_left = block_time;
        }
    }

    locate_block(source, height_left)
        .await
        .ok_or(SamplingError::BlockNotFound(height_left))
}
