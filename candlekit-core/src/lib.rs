//! candlekit core: market data plumbing for a trading/ML pipeline.
//!
//! This crate contains:
//! - Domain types (candles, timeframes, timestamp parsing)
//! - Process-wide configuration (exchange credentials, fetch settings)
//! - The exchange boundary (`Exchange` trait, BinanceUS REST client, synthetic source)
//! - The paginated batch fetcher
//! - Dataset load/save (CSV and Parquet)
//! - Model persistence in a versioned envelope
//! - Distribution plots (histogram + density estimate)

pub mod config;
pub mod dataset;
pub mod domain;
pub mod exchange;
pub mod fetch;
pub mod model;
pub mod plot;

pub use config::{AppConfig, ConfigError, ExchangeConfig, FetchSettings};
pub use dataset::{load_data, save_data, Dataset, DatasetError};
pub use domain::{parse_timestamp, Candle, Timeframe};
pub use exchange::{BinanceUs, Exchange, ExchangeError, SyntheticExchange};
pub use fetch::{fetch_data, FetchOptions, FetchOutcome, Fetcher, StopReason};
pub use model::{load_model, read_model_header, save_model, Model, ModelError};
pub use plot::{DistributionPlot, PlotError, DEFAULT_BINS};
