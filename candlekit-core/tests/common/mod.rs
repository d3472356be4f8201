//! Shared fixtures for integration tests: a scripted in-memory exchange and a
//! sleeper that records instead of sleeping.

#![allow(dead_code)]

use candlekit_core::domain::{Candle, Timeframe};
use candlekit_core::exchange::{Exchange, ExchangeError};
use candlekit_core::fetch::Sleeper;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const HOUR_MS: i64 = 3_600_000;

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn candle(ts_ms: i64, close: f64) -> Candle {
    Candle::from_millis(ts_ms, close - 0.5, close + 1.0, close - 1.0, close, 10.0).unwrap()
}

/// Hourly candles starting at `start`, closes 100, 101, ...
pub fn hourly(start: DateTime<Utc>, count: usize) -> Vec<Candle> {
    let base = start.timestamp_millis();
    (0..count)
        .map(|i| candle(base + i as i64 * HOUR_MS, 100.0 + i as f64))
        .collect()
}

/// In-memory market: serves candles with `timestamp >= since`, up to `limit`,
/// oldest first. Errors can be injected for specific call numbers (0-based).
pub struct FakeExchange {
    candles: Vec<Candle>,
    failures: Mutex<HashMap<usize, ExchangeError>>,
    calls: Mutex<Vec<(i64, usize)>>,
    rate_limit: Duration,
}

impl FakeExchange {
    pub fn new(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        Self {
            candles,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            rate_limit: Duration::from_millis(50),
        }
    }

    pub fn fail_on_call(self, call: usize, error: ExchangeError) -> Self {
        self.failures.lock().unwrap().insert(call, error);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// `(since_ms, limit)` of every request made so far.
    pub fn calls(&self) -> Vec<(i64, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Exchange for FakeExchange {
    fn name(&self) -> &str {
        "fake"
    }

    fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    fn fetch_ohlcv(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        since_ms: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((since_ms, limit));
            calls.len() - 1
        };
        if let Some(err) = self.failures.lock().unwrap().remove(&call) {
            return Err(err);
        }
        Ok(self
            .candles
            .iter()
            .filter(|c| c.timestamp_ms() >= since_ms)
            .take(limit)
            .copied()
            .collect())
    }
}

/// Exchange that replays a fixed list of responses, then returns empty pages.
/// The request parameters are ignored.
pub struct ScriptedExchange {
    responses: Mutex<Vec<Result<Vec<Candle>, ExchangeError>>>,
}

impl ScriptedExchange {
    pub fn new(mut responses: Vec<Result<Vec<Candle>, ExchangeError>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

impl Exchange for ScriptedExchange {
    fn name(&self) -> &str {
        "scripted"
    }

    fn rate_limit(&self) -> Duration {
        Duration::ZERO
    }

    fn fetch_ohlcv(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        _since_ms: i64,
        _limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.responses.lock().unwrap().pop().unwrap_or(Ok(Vec::new()))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
