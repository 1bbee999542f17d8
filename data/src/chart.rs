use chain::Series;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Y-axis scaling mode, persisted with the exported chart so a frontend can
/// restore the user's last choice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum YAxis {
    Default,
    BeginAtZero,
    LogScale,
    #[default]
    Stacked,
}

/// Which side of a lending-market position a dataset shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LendingSide {
    #[default]
    Net,
    Deposits,
    Borrowed,
}

impl std::fmt::Display for LendingSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LendingSide::Net => write!(f, "Net Value"),
            LendingSide::Deposits => write!(f, "Deposits"),
            LendingSide::Borrowed => write!(f, "Borrowed"),
        }
    }
}

/// How one metric entry maps onto a chart y-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum MetricSelector {
    /// Metric values are plain numbers (or numeric strings).
    Scalar,
    /// Metric values are lending positions with `deposit`/`borrow` legs,
    /// each in native units and USD.
    Lending { side: LendingSide, in_usd: bool },
}

impl MetricSelector {
    fn select(&self, value: &Value) -> Option<f64> {
        match self {
            MetricSelector::Scalar => scalar(value),
            MetricSelector::Lending { side, in_usd } => {
                let (deposit_key, borrow_key) = if *in_usd {
                    ("depositUsd", "borrowUsd")
                } else {
                    ("deposit", "borrow")
                };
                match side {
                    LendingSide::Net => {
                        Some(scalar(value.get(deposit_key)?)? - scalar(value.get(borrow_key)?)?)
                    }
                    LendingSide::Deposits => scalar(value.get(deposit_key)?),
                    LendingSide::Borrowed => scalar(value.get(borrow_key)?),
                }
            }
        }
    }
}

fn scalar(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One labeled line of the chart: a metric name and its time-ordered points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub points: Vec<Point>,
}

/// Chart-ready view of a sampled series, written alongside the raw JSON so
/// any frontend can render it without re-deriving the datasets.
#[derive(Debug, Clone, Serialize)]
pub struct LineChart {
    pub title: String,
    pub y_axis: YAxis,
    pub datasets: Vec<Dataset>,
}

/// Builds per-metric datasets from a sampled series.
///
/// Metric labels come from the most recent sample (later rounds can add
/// assets that early blocks don't know about yet). Samples where the
/// selected value is absent or non-numeric are skipped rather than plotted
/// as zero.
pub fn line_data(series: &Series<Value>, selector: MetricSelector) -> Vec<Dataset> {
    let Some(labels) = series
        .last()
        .and_then(|sample| sample.value.as_object())
        .map(|map| map.keys().cloned().collect::<Vec<_>>())
    else {
        return Vec::new();
    };

    labels
        .into_iter()
        .map(|label| {
            let points = series
                .iter()
                .filter_map(|sample| {
                    let y = selector.select(sample.value.get(&label)?)?;
                    Some(Point {
                        x: sample.time_ms,
                        y,
                    })
                })
                .collect();
            Dataset { label, points }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain::Sample;
    use serde_json::json;

    fn series_of(values: Vec<(u64, Value)>) -> Series<Value> {
        let mut series = Series::new();
        series.merge(
            values
                .into_iter()
                .map(|(height, value)| Sample {
                    time_ms: height as f64 * 1_000.0,
                    block_height: height,
                    value,
                })
                .collect(),
        );
        series
    }

    #[test]
    fn scalar_metrics_become_one_dataset_per_label() {
        let series = series_of(vec![
            (1, json!({ "wNEAR": 4.2, "USN": "1.0001" })),
            (2, json!({ "wNEAR": 4.4, "USN": 0.9998 })),
        ]);

        let datasets = line_data(&series, MetricSelector::Scalar);
        assert_eq!(datasets.len(), 2);

        let wnear = datasets.iter().find(|d| d.label == "wNEAR").unwrap();
        assert_eq!(wnear.points.len(), 2);
        assert!((wnear.points[0].y - 4.2).abs() < 1e-9);
        assert!((wnear.points[1].x - 2_000.0).abs() < f64::EPSILON);

        // numeric strings parse too
        let usn = datasets.iter().find(|d| d.label == "USN").unwrap();
        assert!((usn.points[0].y - 1.0001).abs() < 1e-9);
    }

    #[test]
    fn lending_selector_computes_net_deposits_and_borrowed() {
        let position = json!({
            "USDC": { "deposit": 100.0, "depositUsd": 100.5, "borrow": 40.0, "borrowUsd": 40.2 }
        });
        let series = series_of(vec![(1, position)]);

        let net_usd = line_data(
            &series,
            MetricSelector::Lending {
                side: LendingSide::Net,
                in_usd: true,
            },
        );
        assert!((net_usd[0].points[0].y - 60.3).abs() < 1e-9);

        let deposits = line_data(
            &series,
            MetricSelector::Lending {
                side: LendingSide::Deposits,
                in_usd: false,
            },
        );
        assert!((deposits[0].points[0].y - 100.0).abs() < 1e-9);

        let borrowed = line_data(
            &series,
            MetricSelector::Lending {
                side: LendingSide::Borrowed,
                in_usd: true,
            },
        );
        assert!((borrowed[0].points[0].y - 40.2).abs() < 1e-9);
    }

    #[test]
    fn missing_or_null_metrics_are_skipped_not_zeroed() {
        let series = series_of(vec![
            (1, json!({ "BTC": 43_000.0 })),
            (2, json!({ "BTC": null, "ETH": 3_200.0 })),
            (3, json!({ "BTC": 44_000.0, "ETH": 3_250.0 })),
        ]);

        let datasets = line_data(&series, MetricSelector::Scalar);
        let btc = datasets.iter().find(|d| d.label == "BTC").unwrap();
        assert_eq!(btc.points.len(), 2);

        // ETH only exists from the second sample on
        let eth = datasets.iter().find(|d| d.label == "ETH").unwrap();
        assert_eq!(eth.points.len(), 2);
    }

    #[test]
    fn empty_series_yields_no_datasets() {
        let series: Series<Value> = Series::new();
        assert!(line_data(&series, MetricSelector::Scalar).is_empty());
    }

    #[test]
    fn labels_come_from_the_latest_sample() {
        let series = series_of(vec![
            (1, json!({ "OLD": 1.0 })),
            (2, json!({ "NEW": 2.0 })),
        ]);

        let datasets = line_data(&series, MetricSelector::Scalar);
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].label, "NEW");
    }
}
