pub mod adapter;
mod limiter;
pub mod locate;
pub mod resolve;
pub mod sampler;
pub mod unit;

pub use adapter::{ChainError, ChainSource};
pub use sampler::{SamplerConfig, SamplerEvent, Stage};

use serde::{Deserialize, Serialize};

/// Header fields of an archival block that the sampling core reads.
///
/// Owned by the chain data source; the core only ever looks at the height
/// and derives a millisecond timestamp from the nanosecond field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Block {
    pub height: u64,
    pub timestamp_nanos: u64,
}

impl Block {
    /// Block time scaled to milliseconds. Sub-millisecond precision is
    /// discarded; chart timestamps don't need it.
    pub fn time_ms(&self) -> f64 {
        self.timestamp_nanos as f64 / 1e6
    }
}

/// One evaluated data point: the resolved block, its time, and whatever the
/// metric evaluator returned for that height.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample<T> {
    #[serde(rename = "time")]
    pub time_ms: f64,
    #[serde(rename = "blockHeight")]
    pub block_height: u64,
    pub value: T,
}

/// The growing, height-ordered output of a sampling run.
///
/// Samples are only ever appended through [`Series::merge`], which keeps the
/// sequence sorted ascending by block height with no duplicate heights.
/// Cloning gives observers a consistent snapshot at any point mid-run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series<T> {
    samples: Vec<Sample<T>>,
}

impl<T> Series<T> {
    pub fn new() -> Self {
        Series {
            samples: Vec::new(),
        }
    }

    /// Folds freshly fetched samples into the series. Duplicate heights can
    /// occur when forward-probing resolves two nearby candidates to the same
    /// block; the earliest-merged sample wins.
    pub fn merge(&mut self, fresh: Vec<Sample<T>>) {
        self.samples.extend(fresh);
        self.samples.sort_by_key(|s| s.block_height);
        self.samples.dedup_by_key(|s| s.block_height);
    }

    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.samples.iter()
    }

    pub fn last(&self) -> Option<&Sample<T>> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn de_string_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    s.parse::<u64>().map_err(serde::de::Error::custom)
}

#[cfg(test)]
pub(crate) mod testutil;
