//! Fetch state machine.
//!
//! ```text
//!            start >= end
//!   (init) ───────────────────────────────────────────► Done(EmptyRange)
//!     │
//!     ▼            empty page
//!  Fetching ─────────────────────────────────────────► Done(EmptyPage)
//!   ▲  │ │ │       exchange-level error
//!   │  │ │ └─────────────────────────────────────────► Failed(ExchangeError)
//!   │  │ │         unexpected error
//!   │  │ └───────────────────────────────────────────► Failed(Unexpected)
//!   │  │ page
//!   │  ▼           nothing left after filtering
//!   │ Filtering ─────────────────────────────────────► Done(FilteredEmpty)
//!   │  │           page crossed `end` / cursor reached `end`
//!   │  ├─────────────────────────────────────────────► Done(BoundaryReached)
//!   └──┘ more to fetch (after rate-limit pause)
//!
//!  Fetching ──transient error──► Fetching (after retry delay, cursor unchanged)
//! ```

use crate::domain::Candle;
use crate::exchange::ExchangeError;
use std::fmt;

/// Fetcher state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// Next step requests a page starting at the cursor.
    Fetching,
    /// A non-empty page arrived and must be range-filtered.
    Filtering(Vec<Candle>),
    /// Finished normally.
    Done(StopReason),
    /// Aborted by an error; accumulated candles are still returned.
    Failed(StopReason),
}

/// Why a fetch stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// `start >= end`; the exchange was never called.
    EmptyRange,
    /// The exchange returned no candles at the cursor.
    EmptyPage,
    /// The exchange returned candles, but none inside the remaining range.
    FilteredEmpty,
    /// The end of the requested range was reached.
    BoundaryReached,
    /// The exchange rejected the request (bad symbol, auth, ...).
    ExchangeError(ExchangeError),
    /// Anything else, e.g. a malformed response.
    Unexpected(ExchangeError),
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::ExchangeError(_) | StopReason::Unexpected(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EmptyRange => write!(f, "empty range (start >= end)"),
            StopReason::EmptyPage => write!(f, "no more data available"),
            StopReason::FilteredEmpty => write!(f, "no more data within the specified range"),
            StopReason::BoundaryReached => write!(f, "reached end of range"),
            StopReason::ExchangeError(e) => write!(f, "exchange error: {e}"),
            StopReason::Unexpected(e) => write!(f, "unexpected error: {e}"),
        }
    }
}

/// What happened when a page was folded into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Absorbed {
    /// Nothing in the page fell inside `[cursor, end)`.
    Nothing,
    /// `count` candles were appended.
    Appended {
        count: usize,
        /// The page reached or crossed `end`; no further request is needed.
        boundary_reached: bool,
    },
}

/// Mutable bookkeeping for one fetch call.
#[derive(Debug)]
pub struct Session {
    cursor_ms: i64,
    end_ms: i64,
    candles: Vec<Candle>,
    pages: usize,
    retries: usize,
}

impl Session {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self {
            cursor_ms: start_ms,
            end_ms,
            candles: Vec::new(),
            pages: 0,
            retries: 0,
        }
    }

    /// Initial state: `Fetching`, or `Done(EmptyRange)` for an empty range.
    pub fn initial_state(&self) -> FetchState {
        if self.cursor_ms >= self.end_ms {
            FetchState::Done(StopReason::EmptyRange)
        } else {
            FetchState::Fetching
        }
    }

    pub fn cursor_ms(&self) -> i64 {
        self.cursor_ms
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// Keep candles in `[cursor, end)`, append them, and advance the cursor
    /// past the last one.
    ///
    /// Candles before the cursor are stale rows the exchange re-sent; they are
    /// dropped so the accumulated series stays strictly increasing.
    pub fn absorb(&mut self, mut page: Vec<Candle>) -> Absorbed {
        page.sort_by_key(|c| c.timestamp);

        let crossed_end = page.iter().any(|c| c.timestamp_ms() >= self.end_ms);
        let mut last_kept: Option<i64> = None;
        let before = self.candles.len();

        for candle in page {
            let ts = candle.timestamp_ms();
            if ts < self.cursor_ms || ts >= self.end_ms {
                continue;
            }
            if last_kept == Some(ts) {
                continue;
            }
            last_kept = Some(ts);
            self.candles.push(candle);
        }

        let count = self.candles.len() - before;
        match last_kept {
            None => Absorbed::Nothing,
            Some(last) => {
                self.pages += 1;
                self.cursor_ms = last + 1;
                Absorbed::Appended {
                    count,
                    boundary_reached: crossed_end || self.cursor_ms >= self.end_ms,
                }
            }
        }
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }
}
