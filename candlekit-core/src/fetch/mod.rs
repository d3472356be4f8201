//! Batch OHLCV fetcher.
//!
//! Pulls fixed-size pages of candles from an [`Exchange`] between a start and
//! end timestamp, filters rows outside `[start, end)`, concatenates the pages
//! and paces requests to respect the exchange's rate limit.
//!
//! Error policy:
//! - transient network errors are retried after a fixed delay, indefinitely;
//! - exchange-level and unexpected errors stop the fetch, and whatever was
//!   accumulated so far is returned.
//!
//! The fetch itself never fails: the worst case is an empty dataset.

pub mod progress;
pub mod session;

pub use progress::{FetchProgress, Sleeper, ThreadSleeper, TracingProgress};
pub use session::{Absorbed, FetchState, Session, StopReason};

use crate::config::{AppConfig, FetchSettings};
use crate::dataset::Dataset;
use crate::domain::{Candle, Timeframe};
use crate::exchange::{BinanceUs, ErrorClass, Exchange};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Pagination and pacing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum candles requested per page.
    pub page_size: usize,
    /// Wait after a transient error before requesting the same page again.
    pub retry_delay: Duration,
    /// Pause between successful requests. `None` uses the exchange's rate limit.
    pub pace: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchSettings::default().into()
    }
}

impl From<FetchSettings> for FetchOptions {
    fn from(settings: FetchSettings) -> Self {
        Self {
            page_size: settings.page_size.max(1),
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
            pace: None,
        }
    }
}

/// Result of a fetch: the dataset plus how the fetch ended.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub dataset: Dataset,
    pub stop: StopReason,
    /// Pages that contributed at least one candle.
    pub pages: usize,
    /// Transient errors that were retried.
    pub retries: usize,
}

/// Paginated fetcher over an injectable exchange.
pub struct Fetcher<'a> {
    exchange: &'a dyn Exchange,
    options: FetchOptions,
    sleeper: &'a dyn Sleeper,
    progress: &'a dyn FetchProgress,
}

impl<'a> Fetcher<'a> {
    pub fn new(exchange: &'a dyn Exchange) -> Self {
        Self {
            exchange,
            options: FetchOptions::default(),
            sleeper: &ThreadSleeper,
            progress: &TracingProgress,
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch every candle for `symbol` with open time in `[start, end)`.
    pub fn run(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchOutcome {
        let mut session = Session::new(start.timestamp_millis(), end.timestamp_millis());
        let mut state = session.initial_state();

        let stop = loop {
            state = match state {
                FetchState::Done(reason) | FetchState::Failed(reason) => break reason,
                FetchState::Fetching => self.request_page(&mut session, symbol, timeframe),
                FetchState::Filtering(page) => self.filter_page(&mut session, symbol, page),
            };
        };

        self.progress.on_stop(symbol, &stop, session.candles().len());

        FetchOutcome {
            pages: session.pages(),
            retries: session.retries(),
            stop,
            dataset: Dataset::new(session.into_candles()),
        }
    }

    fn request_page(&self, session: &mut Session, symbol: &str, timeframe: Timeframe) -> FetchState {
        match self.exchange.fetch_ohlcv(
            symbol,
            timeframe,
            session.cursor_ms(),
            self.options.page_size,
        ) {
            Ok(page) if page.is_empty() => FetchState::Done(StopReason::EmptyPage),
            Ok(page) => FetchState::Filtering(page),
            Err(err) => match err.class() {
                ErrorClass::Transient => {
                    session.record_retry();
                    self.progress.on_retry(symbol, &err, self.options.retry_delay);
                    self.sleeper.sleep(self.options.retry_delay);
                    FetchState::Fetching
                }
                ErrorClass::Exchange => FetchState::Failed(StopReason::ExchangeError(err)),
                ErrorClass::Unexpected => FetchState::Failed(StopReason::Unexpected(err)),
            },
        }
    }

    fn filter_page(&self, session: &mut Session, symbol: &str, page: Vec<Candle>) -> FetchState {
        let before = session.candles().len();
        match session.absorb(page) {
            Absorbed::Nothing => FetchState::Done(StopReason::FilteredEmpty),
            Absorbed::Appended {
                count,
                boundary_reached,
            } => {
                let appended = &session.candles()[before..];
                if let (Some(first), Some(last)) = (appended.first(), appended.last()) {
                    self.progress.on_page(symbol, first, last, count);
                }
                if boundary_reached {
                    FetchState::Done(StopReason::BoundaryReached)
                } else {
                    let pace = self.options.pace.unwrap_or_else(|| self.exchange.rate_limit());
                    self.sleeper.sleep(pace);
                    FetchState::Fetching
                }
            }
        }
    }
}

/// Fetch candles from BinanceUS using process-wide configuration.
///
/// If the exchange client cannot be initialized the error is logged and an
/// empty dataset is returned.
pub fn fetch_data(
    config: &AppConfig,
    symbol: &str,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Dataset {
    let exchange = match BinanceUs::new(&config.binanceus) {
        Ok(exchange) => exchange,
        Err(e) => {
            tracing::error!(error = %e, "Error initializing exchange");
            return Dataset::empty();
        }
    };

    Fetcher::new(&exchange)
        .with_options(config.fetch.into())
        .run(symbol, timeframe, start, end)
        .dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeConfig;
    use chrono::TimeZone;

    #[test]
    fn options_follow_settings() {
        let opts = FetchOptions::from(FetchSettings {
            page_size: 200,
            retry_delay_secs: 2,
        });
        assert_eq!(opts.page_size, 200);
        assert_eq!(opts.retry_delay, Duration::from_secs(2));
        assert_eq!(opts.pace, None);
    }

    #[test]
    fn default_options() {
        let opts = FetchOptions::default();
        assert_eq!(opts.page_size, 500);
        assert_eq!(opts.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let opts = FetchOptions::from(FetchSettings {
            page_size: 0,
            retry_delay_secs: 5,
        });
        assert_eq!(opts.page_size, 1);
    }

    #[test]
    fn init_failure_yields_empty_dataset() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        // Rejected at client construction, so no request (and no retry) happens.
        for base_url in ["not a url", "https://bad host"] {
            let mut exchange = ExchangeConfig::new("key", "secret");
            exchange.base_url = base_url.into();
            let config = AppConfig {
                binanceus: exchange,
                fetch: FetchSettings::default(),
            };

            let dataset = fetch_data(&config, "BTC/USD", Timeframe::H1, start, end);
            assert!(dataset.is_empty(), "{base_url}");
        }
    }
}
