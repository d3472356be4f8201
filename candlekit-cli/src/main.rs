//! candlekit CLI: fetch candles, inspect datasets, plot distributions.
//!
//! Commands:
//! - `fetch`: download OHLCV candles from BinanceUS (or a synthetic source)
//!   and save them as CSV or Parquet
//! - `plot`: histogram + KDE of one dataset column, to an image or the terminal
//! - `inspect`: row count, time range and fingerprint of a dataset file
//! - `model-info`: header of a saved model file

use anyhow::{bail, Context, Result};
use candlekit_core::config::AppConfig;
use candlekit_core::dataset::{load_data, save_data, Dataset};
use candlekit_core::domain::{format_timestamp, parse_timestamp, Timeframe};
use candlekit_core::exchange::SyntheticExchange;
use candlekit_core::fetch::{fetch_data, FetchOptions, Fetcher};
use candlekit_core::model::read_model_header;
use candlekit_core::plot::{DistributionPlot, DEFAULT_BINS};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "candlekit",
    version,
    about = "candlekit: OHLCV market data fetcher and toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles for a symbol over [start, end) and save them.
    Fetch {
        /// Market symbol, e.g. BTC/USD.
        symbol: String,

        /// Candle timeframe (1m, 5m, 1h, 1d, ...).
        #[arg(long, default_value = "1h")]
        timeframe: String,

        /// Range start (inclusive). "YYYY-MM-DD HH:MM:SS", RFC 3339, a date, or epoch ms.
        #[arg(long)]
        start: String,

        /// Range end (exclusive). Same formats as --start.
        #[arg(long)]
        end: String,

        /// Output file; `.parquet` writes Parquet, anything else CSV.
        #[arg(long)]
        out: PathBuf,

        /// Generate deterministic synthetic candles instead of calling the exchange.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Config file. Defaults to config/config.toml, then the user config dir.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Plot the distribution of one dataset column.
    Plot {
        /// Dataset file (CSV or Parquet).
        file: PathBuf,

        /// Column to plot: open, high, low, close or volume.
        #[arg(long, default_value = "close")]
        column: String,

        /// Histogram bin count.
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,

        /// Write an image (PNG or SVG) instead of opening the terminal viewer.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Summarize a dataset file.
    Inspect {
        /// Dataset file (CSV or Parquet).
        file: PathBuf,
    },
    /// Print the header of a saved model file.
    ModelInfo {
        /// Model file.
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbol,
            timeframe,
            start,
            end,
            out,
            synthetic,
            config,
        } => run_fetch(&symbol, &timeframe, &start, &end, &out, synthetic, config),
        Commands::Plot {
            file,
            column,
            bins,
            out,
        } => run_plot(&file, &column, bins, out.as_deref()),
        Commands::Inspect { file } => run_inspect(&file),
        Commands::ModelInfo { file } => run_model_info(&file),
    }
}

fn run_fetch(
    symbol: &str,
    timeframe: &str,
    start: &str,
    end: &str,
    out: &Path,
    synthetic: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let timeframe: Timeframe = timeframe.parse()?;
    let start = parse_timestamp(start).context("invalid --start")?;
    let end = parse_timestamp(end).context("invalid --end")?;

    let dataset = if synthetic {
        let exchange = SyntheticExchange::until_now(start);
        Fetcher::new(&exchange)
            .with_options(FetchOptions::default())
            .run(symbol, timeframe, start, end)
            .dataset
    } else {
        let config = AppConfig::load(config_path.as_deref())?;
        fetch_data(&config, symbol, timeframe, start, end)
    };

    if dataset.is_empty() {
        tracing::warn!(symbol, "no candles fetched; writing an empty dataset");
    }
    save_data(Some(&dataset), out)?;
    print_summary(&dataset);
    Ok(())
}

fn run_plot(file: &Path, column: &str, bins: usize, out: Option<&Path>) -> Result<()> {
    let dataset = load_data(file)?;
    let Some(values) = dataset.column(column) else {
        bail!(
            "unknown column '{column}'. Valid: {}",
            dataset.columns()[1..].join(", ")
        );
    };

    let plot = DistributionPlot::new(&values, bins)
        .with_context(|| format!("cannot plot column '{column}' of {}", file.display()))?;

    match out {
        Some(path) => {
            plot.render_to_file(path)?;
            println!("Plot written to: {}", path.display());
        }
        None => candlekit_tui::show_distribution(&plot)?,
    }
    Ok(())
}

fn run_inspect(file: &Path) -> Result<()> {
    let dataset = load_data(file)?;
    println!("File:        {}", file.display());
    println!("Columns:     {}", dataset.columns().join(", "));
    print_summary(&dataset);
    println!(
        "Ordered:     {}",
        if dataset.is_strictly_ordered() { "yes" } else { "no" }
    );
    println!("Fingerprint: {}", dataset.fingerprint());
    Ok(())
}

fn run_model_info(file: &Path) -> Result<()> {
    let header = read_model_header(file)?;
    println!("File:           {}", file.display());
    println!("Kind:           {}", header.kind);
    println!("Schema version: {}", header.schema_version);
    println!("Saved at:       {}", header.saved_at.to_rfc3339());
    println!("Checksum:       {}", header.checksum);
    Ok(())
}

fn print_summary(dataset: &Dataset) {
    println!("Rows:        {}", dataset.len());
    match dataset.time_range() {
        Some((first, last)) => println!(
            "Range:       {} .. {}",
            format_timestamp(&first),
            format_timestamp(&last)
        ),
        None => println!("Range:       (empty)"),
    }
}
