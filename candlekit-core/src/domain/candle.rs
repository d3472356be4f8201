//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::serde_timestamp;

/// OHLCV candle for one symbol over one timeframe interval.
///
/// `timestamp` is the interval's open time. Field order matches the dataset
/// column order: `timestamp, open, high, low, close, volume`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(with = "serde_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Column names, in dataset order.
    pub const COLUMNS: [&'static str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

    /// Build a candle from an epoch-millisecond open time.
    ///
    /// Returns `None` if the timestamp is outside chrono's representable range.
    pub fn from_millis(
        timestamp_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Option<Self> {
        Some(Self {
            timestamp: DateTime::from_timestamp_millis(timestamp_ms)?,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Open time in epoch milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Value of a numeric column by name (`open`, `high`, `low`, `close`, `volume`).
    pub fn field(&self, column: &str) -> Option<f64> {
        match column {
            "open" => Some(self.open),
            "high" => Some(self.high),
            "low" => Some(self.low),
            "close" => Some(self.close),
            "volume" => Some(self.volume),
            _ => None,
        }
    }
}
