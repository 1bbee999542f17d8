use crate::adapter::{ChainError, ChainSource};
use crate::locate::locate_block;
use crate::resolve::resolve_start_block;
use crate::{Sample, Series};

use futures::{StreamExt, stream};
use tokio::sync::mpsc;

use std::fmt;

/// Tuning knobs for one sampling run. Passed at call time so callers (and
/// tests) can pick extreme values instead of relying on process-wide
/// constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Bisection rounds; the series tops out at `2^rounds + 1` samples.
    pub rounds: usize,
    /// In-flight cap on chain calls within a round.
    pub concurrency: usize,
    /// How close (in ms) a block's time must be to the target to accept it.
    pub tolerance_ms: f64,
    /// Assumed block interval for the initial backward extrapolation.
    pub optimistic_ms_per_block: f64,
    /// Hard cap on how far below the chain head the start search may reach.
    pub max_lookback_blocks: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            rounds: 8,
            concurrency: 8,
            tolerance_ms: 60_000.0,
            optimistic_ms_per_block: 900.0,
            max_lookback_blocks: 10_000_000,
        }
    }
}

/// Human-readable phase of a sampling run, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingCurrentBlock,
    SearchingStartBlock,
    FetchingInitialData,
    Refining { iteration: usize, total: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FetchingCurrentBlock => write!(f, "fetching current block"),
            Stage::SearchingStartBlock => write!(f, "searching for the starting block"),
            Stage::FetchingInitialData => write!(f, "fetching initial data"),
            Stage::Refining { iteration, total } => {
                write!(f, "increasing precision, iteration {iteration} / {total}")
            }
        }
    }
}

/// Events published to observers while a run is in flight.
///
/// `Series` carries a full snapshot: the receiver may render it immediately
/// without coordinating with the sampler.
#[derive(Debug, Clone)]
pub enum SamplerEvent<T> {
    Progress(Stage),
    Series(Series<T>),
    Finished { failed_heights: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum SamplingError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("no block found within the probe window at height {0}")]
    BlockNotFound(u64),
    #[error("current block {0} is missing from the archival source")]
    CurrentBlockMissing(u64),
}

/// Runs the full progressive-sampling loop against `source`.
///
/// Establishes the `[start, head]` height range for `target_start_time_ms`,
/// then repeatedly: fetches a data point for every candidate height with at
/// most `cfg.concurrency` chain calls in flight, merges the successes into
/// the series, publishes a snapshot, and bisects every adjacent pair of
/// known heights to produce the next round's candidates. Individual height
/// failures are logged and counted, never retried at the same height, and
/// never abort the run; only the initial head/start resolution is fatal.
pub async fn run_sampling<S, T, F, Fut>(
    source: &S,
    cfg: SamplerConfig,
    target_start_time_ms: f64,
    evaluate: F,
    events: &mpsc::UnboundedSender<SamplerEvent<T>>,
) -> Result<Series<T>, SamplingError>
where
    S: ChainSource,
    T: Clone,
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let _ = events.send(SamplerEvent::Progress(Stage::FetchingCurrentBlock));
    let current_height = source.current_height().await?;
    log::info!("current block height: {current_height}");

    let current_block = source
        .block_by_height(current_height)
        .await?
        .ok_or(SamplingError::CurrentBlockMissing(current_height))?;

    let _ = events.send(SamplerEvent::Progress(Stage::SearchingStartBlock));
    let start_block = resolve_start_block(source, target_start_time_ms, &current_block, &cfg).await?;
    log::info!("start block height: {}", start_block.height);

    let _ = events.send(SamplerEvent::Progress(Stage::FetchingInitialData));

    let mut heights = vec![start_block.height, current_height];
    let mut all_heights = heights.clone();
    let mut series = Series::new();
    let mut failed_heights = 0usize;

    for round in 0..cfg.rounds {
        let outcomes: Vec<(u64, Result<Sample<T>, ChainError>)> =
            stream::iter(heights.iter().copied())
                .map(|height| {
                    let evaluate = &evaluate;
                    async move { (height, sample_point(source, height, evaluate).await) }
                })
                .buffer_unordered(cfg.concurrency.max(1))
                .collect()
                .await;

        let mut fresh = Vec::with_capacity(outcomes.len());
        for (height, outcome) in outcomes {
            match outcome {
                Ok(sample) => fresh.push(sample),
                Err(err) => {
                    failed_heights += 1;
                    log::warn!("sampling height {height} failed: {err}");
                }
            }
        }

        series.merge(fresh);
        let _ = events.send(SamplerEvent::Series(series.clone()));
        let _ = events.send(SamplerEvent::Progress(Stage::Refining {
            iteration: round + 1,
            total: cfg.rounds,
        }));

        heights = split_heights(&mut all_heights);
        if heights.is_empty() {
            // every adjacent pair is contiguous; further rounds would
            // re-request known heights
            break;
        }
    }

    let _ = events.send(SamplerEvent::Finished { failed_heights });
    Ok(series)
}

/// Resolves one candidate height to a real block and evaluates the metrics
/// at that block. The sample carries the resolved height, which may sit a
/// few blocks above the requested one.
async fn sample_point<S, T, F, Fut>(
    source: &S,
    approx_height: u64,
    evaluate: &F,
) -> Result<Sample<T>, ChainError>
where
    S: ChainSource,
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let block = locate_block(source, approx_height).await.ok_or_else(|| {
        ChainError::InvalidRequest(format!(
            "no block within the probe window at height {approx_height}"
        ))
    })?;

    let value = evaluate(block.height).await?;

    Ok(Sample {
        time_ms: block.time_ms(),
        block_height: block.height,
        value,
    })
}

/// Inserts the midpoint of every adjacent pair of `all_heights` and returns
/// the newly inserted heights in ascending order.
///
/// A midpoint that collapses onto its left bound (adjacent heights) is
/// dropped, so the set stays strictly increasing and no height is ever
/// requested twice.
fn split_heights(all_heights: &mut Vec<u64>) -> Vec<u64> {
    let mut inserted = Vec::with_capacity(all_heights.len());

    for pair in all_heights.windows(2) {
        let mid = pair[0] + ((pair[1] - pair[0]) >> 1);
        if mid != pair[0] {
            inserted.push(mid);
        }
    }

    all_heights.extend_from_slice(&inserted);
    all_heights.sort_unstable();
    inserted
}
