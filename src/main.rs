mod dashboard;
mod logger;

use chain::adapter::near::NearRpc;
use chain::sampler::{self, SamplerConfig, SamplerEvent};
use dashboard::Variant;
use data::chart::{LendingSide, LineChart, MetricSelector, YAxis, line_data};

use clap::Parser;
use tokio::sync::mpsc;

/// Samples historical chain state with progressively increasing temporal
/// resolution and exports the metric series as chart data and raw JSON.
#[derive(Parser, Debug)]
#[command(name = "chainscope", version, about)]
struct Args {
    /// Dashboard to sample
    #[arg(value_enum)]
    variant: Variant,

    /// Start of the charted window, UTC
    #[arg(long, default_value = "2022-03-28")]
    start_date: chrono::NaiveDate,

    /// Bisection rounds; the final series holds up to 2^(rounds-1) + 1 points
    #[arg(long, default_value_t = 8)]
    rounds: usize,

    /// Concurrent chain calls per round
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Archival RPC endpoint; defaults to the variant's network
    #[arg(long)]
    rpc: Option<String>,

    /// Which leg of a lending position to chart
    #[arg(long, value_enum, default_value_t = SideArg::Net)]
    side: SideArg,

    /// Chart native token units instead of USD
    #[arg(long)]
    native: bool,

    /// Y-axis scaling hint stored with the exported chart
    #[arg(long, value_enum, default_value_t = YAxisArg::Stacked)]
    y_axis: YAxisArg,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum SideArg {
    Net,
    Deposits,
    Borrowed,
}

impl From<SideArg> for LendingSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Net => LendingSide::Net,
            SideArg::Deposits => LendingSide::Deposits,
            SideArg::Borrowed => LendingSide::Borrowed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum YAxisArg {
    Default,
    BeginAtZero,
    LogScale,
    Stacked,
}

impl From<YAxisArg> for YAxis {
    fn from(axis: YAxisArg) -> Self {
        match axis {
            YAxisArg::Default => YAxis::Default,
            YAxisArg::BeginAtZero => YAxis::BeginAtZero,
            YAxisArg::LogScale => YAxis::LogScale,
            YAxisArg::Stacked => YAxis::Stacked,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    logger::setup(args.debug || cfg!(debug_assertions)).expect("Failed to initialize logger");

    if let Err(err) = run(args).await {
        log::error!("sampling aborted: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let variant = args.variant;

    let start_time_ms = args
        .start_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
        .timestamp_millis() as f64;

    let endpoint = args
        .rpc
        .unwrap_or_else(|| variant.default_endpoint().to_string());
    let rpc = NearRpc::new(endpoint);

    log::info!(
        "{}: sampling from {} via {}",
        variant.title(),
        args.start_date,
        rpc.endpoint()
    );

    let cfg = SamplerConfig {
        rounds: args.rounds,
        concurrency: args.concurrency,
        ..SamplerConfig::default()
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SamplerEvent::Progress(stage) => log::info!("{stage}"),
                SamplerEvent::Series(series) => {
                    log::info!("series updated: {} samples", series.len());
                }
                SamplerEvent::Finished { failed_heights } => {
                    if failed_heights > 0 {
                        log::warn!("{failed_heights} heights failed and were left unsampled");
                    }
                }
            }
        }
    });

    let eval_rpc = rpc.clone();
    let series = sampler::run_sampling(
        &rpc,
        cfg,
        start_time_ms,
        |height| {
            let rpc = eval_rpc.clone();
            async move { variant.evaluate(&rpc, height).await }
        },
        &tx,
    )
    .await?;

    drop(tx);
    let _ = progress.await;

    if series.is_empty() {
        log::warn!("no samples were collected; nothing to export");
        return Ok(());
    }

    let raw = serde_json::to_string_pretty(&series)?;
    let raw_path = data::write_json_to_file(&raw, &format!("{}-raw.json", variant.slug()))?;
    log::info!("raw series written to {}", raw_path.display());

    let selector: MetricSelector = variant.selector(args.side.into(), !args.native);
    let chart = LineChart {
        title: variant.title().to_string(),
        y_axis: args.y_axis.into(),
        datasets: line_data(&series, selector),
    };
    let chart_path = data::write_json_to_file(
        &serde_json::to_string_pretty(&chart)?,
        &format!("{}-chart.json", variant.slug()),
    )?;
    log::info!("chart datasets written to {}", chart_path.display());

    if let Some(last) = series.last() {
        log::info!(
            "latest sample at block {}: {}",
            last.block_height,
            serde_json::to_string(&last.value)?
        );
    }

    Ok(())
}
