//! Candle granularity codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MS_IN_MIN: i64 = 60_000;
const MS_IN_H: i64 = 60 * MS_IN_MIN;
const MS_IN_D: i64 = 24 * MS_IN_H;

/// Candle interval, using the exchange's string codes (`1m`, `1h`, `1d`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "3d")]
    D3,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    Month1,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported timeframe '{0}' (expected one of 1m 3m 5m 15m 30m 1h 2h 4h 6h 8h 12h 1d 3d 1w 1M)")]
pub struct TimeframeError(pub String);

impl Timeframe {
    pub const ALL: [Timeframe; 15] = [
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H6,
        Timeframe::H8,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::D3,
        Timeframe::W1,
        Timeframe::Month1,
    ];

    /// Exchange string code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H8 => "8h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::D3 => "3d",
            Timeframe::W1 => "1w",
            Timeframe::Month1 => "1M",
        }
    }

    /// Nominal interval length. A month counts as 30 days.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::M1 => MS_IN_MIN,
            Timeframe::M3 => 3 * MS_IN_MIN,
            Timeframe::M5 => 5 * MS_IN_MIN,
            Timeframe::M15 => 15 * MS_IN_MIN,
            Timeframe::M30 => 30 * MS_IN_MIN,
            Timeframe::H1 => MS_IN_H,
            Timeframe::H2 => 2 * MS_IN_H,
            Timeframe::H4 => 4 * MS_IN_H,
            Timeframe::H6 => 6 * MS_IN_H,
            Timeframe::H8 => 8 * MS_IN_H,
            Timeframe::H12 => 12 * MS_IN_H,
            Timeframe::D1 => MS_IN_D,
            Timeframe::D3 => 3 * MS_IN_D,
            Timeframe::W1 => 7 * MS_IN_D,
            Timeframe::Month1 => 30 * MS_IN_D,
        }
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" (month) and "1m" (minute) differ only by case, so no case folding.
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s.trim())
            .ok_or_else(|| TimeframeError(s.to_string()))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
