//! Synthetic candle source for offline runs and demos.
//!
//! Candles sit on the timeframe grid starting at `listed_at` and stop at
//! `delisted_at`. Each candle is generated from an RNG seeded by
//! (symbol, timeframe, index), so any page is reproducible regardless of which
//! `since` it was requested with.

use super::{Exchange, ExchangeError};
use crate::domain::{Candle, Timeframe};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Deterministic, network-free exchange.
#[derive(Debug, Clone)]
pub struct SyntheticExchange {
    listed_at_ms: i64,
    delisted_at_ms: i64,
}

impl SyntheticExchange {
    /// Source with history from `listed_at` up to (excluding) `delisted_at`.
    pub fn new(listed_at: DateTime<Utc>, delisted_at: DateTime<Utc>) -> Self {
        Self {
            listed_at_ms: listed_at.timestamp_millis(),
            delisted_at_ms: delisted_at.timestamp_millis(),
        }
    }

    /// Source with history from `listed_at` until now.
    pub fn until_now(listed_at: DateTime<Utc>) -> Self {
        Self::new(listed_at, Utc::now())
    }

    fn seed(symbol: &str, timeframe: Timeframe, index: i64) -> [u8; 32] {
        let key = format!("{symbol}|{timeframe}|{index}");
        *blake3::hash(key.as_bytes()).as_bytes()
    }

    /// Per-symbol price level in [10, 1000).
    fn base_price(symbol: &str) -> f64 {
        let mut rng = StdRng::from_seed(*blake3::hash(symbol.as_bytes()).as_bytes());
        rng.gen_range(10.0..1000.0)
    }

    fn candle_at(&self, symbol: &str, timeframe: Timeframe, index: i64) -> Option<Candle> {
        let ts = self.listed_at_ms + index * timeframe.duration_ms();
        let mut rng = StdRng::from_seed(Self::seed(symbol, timeframe, index));

        // Slow oscillation gives plots and distributions some shape.
        let mid = Self::base_price(symbol) * (1.0 + 0.2 * (index as f64 * 0.05).sin());
        let open = mid * (1.0 + rng.gen_range(-0.01..0.01));
        let close = mid * (1.0 + rng.gen_range(-0.01..0.01));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let volume = rng.gen_range(1.0..500.0);

        Candle::from_millis(ts, open, high, low, close, volume)
    }
}

impl Exchange for SyntheticExchange {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn rate_limit(&self) -> Duration {
        Duration::ZERO
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        if symbol.trim().is_empty() {
            return Err(ExchangeError::BadSymbol {
                symbol: symbol.to_string(),
            });
        }

        let step = timeframe.duration_ms();
        // First grid index whose open time is >= since.
        let offset = since_ms - self.listed_at_ms;
        let first = if offset <= 0 {
            0
        } else {
            (offset + step - 1) / step
        };

        let candles = (first..)
            .map_while(|i| {
                let ts = self.listed_at_ms + i * step;
                (ts < self.delisted_at_ms).then_some(i)
            })
            .take(limit)
            .filter_map(|i| self.candle_at(symbol, timeframe, i))
            .collect();
        Ok(candles)
    }
}
