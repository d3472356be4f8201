//! Exchange boundary and structured error types.
//!
//! The `Exchange` trait is the single capability the batch fetcher needs:
//! "give me up to N candles since T". Implementations handle the specifics of
//! a particular venue, so the fetcher can be driven by a deterministic fake in
//! tests and by the synthetic source when offline.

pub mod binanceus;
pub mod synthetic;

pub use binanceus::BinanceUs;
pub use synthetic::SyntheticExchange;

use crate::domain::{Candle, Timeframe};
use std::time::Duration;
use thiserror::Error;

/// Structured error types for exchange operations.
///
/// Variants fall into three classes (see [`ErrorClass`]): transient network
/// conditions that are worth retrying, exchange-level rejections that will not
/// go away on retry, and anything else.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExchangeError {
    #[error("exchange initialization failed: {0}")]
    Init(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by exchange: {0}")]
    RateLimited(String),

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("bad symbol: {symbol}")]
    BadSymbol { symbol: String },

    #[error("exchange error: {0}")]
    Exchange(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// How the fetcher should react to an [`ExchangeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry the same request after a fixed delay.
    Transient,
    /// Stop fetching; keep what was accumulated.
    Exchange,
    /// Stop fetching; keep what was accumulated.
    Unexpected,
}

impl ExchangeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ExchangeError::Network(_) | ExchangeError::RateLimited(_) => ErrorClass::Transient,
            ExchangeError::Init(_)
            | ExchangeError::Authentication(_)
            | ExchangeError::BadSymbol { .. }
            | ExchangeError::Exchange(_) => ErrorClass::Exchange,
            ExchangeError::Unexpected(_) => ErrorClass::Unexpected,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// A source of OHLCV candles.
pub trait Exchange: Send + Sync {
    /// Human-readable name of this exchange.
    fn name(&self) -> &str;

    /// Minimum interval between consecutive requests.
    fn rate_limit(&self) -> Duration;

    /// Fetch up to `limit` candles for `symbol` whose open time is at or after
    /// `since_ms`, oldest first.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;
}
