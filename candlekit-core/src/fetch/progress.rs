//! Progress reporting and pacing hooks for the batch fetcher.

use super::StopReason;
use crate::domain::{format_timestamp, Candle};
use crate::exchange::ExchangeError;
use std::time::Duration;

/// Observer for fetch progress.
pub trait FetchProgress {
    /// A filtered page was appended to the result.
    fn on_page(&self, symbol: &str, first: &Candle, last: &Candle, count: usize);

    /// A transient error occurred; the same page will be requested again after `delay`.
    fn on_retry(&self, symbol: &str, error: &ExchangeError, delay: Duration);

    /// The fetch finished with `total` candles accumulated.
    fn on_stop(&self, symbol: &str, reason: &StopReason, total: usize);
}

/// Progress reporter that logs through `tracing`.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_page(&self, symbol: &str, first: &Candle, last: &Candle, count: usize) {
        tracing::info!(
            symbol,
            count,
            "Fetched data from {} to {}",
            format_timestamp(&first.timestamp),
            format_timestamp(&last.timestamp)
        );
    }

    fn on_retry(&self, symbol: &str, error: &ExchangeError, delay: Duration) {
        tracing::warn!(symbol, error = %error, "transient error, retrying in {delay:?}");
    }

    fn on_stop(&self, symbol: &str, reason: &StopReason, total: usize) {
        if reason.is_failure() {
            tracing::error!(symbol, total, "fetch aborted: {reason}");
        } else {
            tracing::info!(symbol, total, "fetch finished: {reason}");
        }
    }
}

/// Blocking wait used for rate-limit pacing and retry delays.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
