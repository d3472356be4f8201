//! BinanceUS REST client.
//!
//! Fetches candles from the public `/api/v3/klines` endpoint with a blocking
//! HTTP client. The API key is attached as `X-MBX-APIKEY` so requests count
//! against the account's limits rather than the caller's IP.
//!
//! HTTP status mapping:
//! - 429 / 418 (rate limit, temporary IP ban) → `RateLimited` (transient)
//! - 5xx → `Network` (transient)
//! - 401 / 403 → `Authentication`
//! - 400 with code -1121 → `BadSymbol`
//! - other 4xx → `Exchange`
//!
//! Transport failures: connect, timeout and dropped bodies → `Network`
//! (transient); requests that cannot be built or decoded → `Unexpected`.

use super::{Exchange, ExchangeError};
use crate::config::ExchangeConfig;
use crate::domain::{Candle, Timeframe};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Largest page the klines endpoint will serve.
pub const MAX_KLINES_LIMIT: usize = 1000;

/// Binance error code for an unknown trading pair.
const CODE_INVALID_SYMBOL: i64 = -1121;

/// Error payload returned alongside 4xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    msg: String,
}

/// BinanceUS exchange client.
pub struct BinanceUs {
    client: Client,
    klines_url: Url,
    rate_limit: Duration,
}

impl BinanceUs {
    /// Build an authenticated client from credentials.
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let klines_url = Self::parse_klines_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let key = HeaderValue::from_str(&config.api_key)
                .map_err(|e| ExchangeError::Init(format!("API key is not a valid header value: {e}")))?;
            headers.insert("x-mbx-apikey", key);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("candlekit/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| ExchangeError::Init(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            klines_url,
            rate_limit: Duration::from_millis(config.rate_limit_ms),
        })
    }

    /// Convert a unified `BASE/QUOTE` symbol into the exchange's market id.
    pub fn market_id(symbol: &str) -> Result<String, ExchangeError> {
        let bad = || ExchangeError::BadSymbol {
            symbol: symbol.to_string(),
        };
        let parts: Vec<&str> = symbol.trim().split('/').collect();
        let valid_part = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric());

        match parts.as_slice() {
            [base, quote] if valid_part(base) && valid_part(quote) => {
                Ok(format!("{base}{quote}").to_ascii_uppercase())
            }
            [joined] if valid_part(joined) => Ok(joined.to_ascii_uppercase()),
            _ => Err(bad()),
        }
    }

    /// Validate `base_url` and derive the klines endpoint from it.
    fn parse_klines_url(base_url: &str) -> Result<Url, ExchangeError> {
        let invalid = |reason: String| {
            ExchangeError::Init(format!("invalid base_url '{base_url}': {reason}"))
        };
        let endpoint = format!("{}/api/v3/klines", base_url.trim_end_matches('/'));
        let url = Url::parse(&endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if !url.has_host() {
            return Err(invalid("missing host".into()));
        }
        Ok(url)
    }

    /// Map a transport-level failure. Only connection problems are worth
    /// retrying; a request that cannot be built or decoded never succeeds.
    fn classify_transport(err: &reqwest::Error) -> ExchangeError {
        if err.is_builder() || err.is_decode() || err.is_redirect() {
            ExchangeError::Unexpected(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            ExchangeError::Network(err.to_string())
        } else {
            ExchangeError::Unexpected(err.to_string())
        }
    }

    /// Map a non-success HTTP response to an error.
    fn classify_status(status: StatusCode, body: &str, symbol: &str) -> ExchangeError {
        let detail = serde_json::from_str::<ErrorBody>(body).ok();
        let message = detail
            .as_ref()
            .map(|d| format!("{} (code {})", d.msg, d.code))
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            return ExchangeError::RateLimited(message);
        }
        if status.is_server_error() {
            return ExchangeError::Network(message);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ExchangeError::Authentication(message);
        }
        if detail.map(|d| d.code) == Some(CODE_INVALID_SYMBOL) {
            return ExchangeError::BadSymbol {
                symbol: symbol.to_string(),
            };
        }
        ExchangeError::Exchange(message)
    }

    /// Parse the klines payload: an array of arrays whose first six entries are
    /// open time (integer ms) followed by OHLCV as decimal strings.
    fn parse_klines(body: &str) -> Result<Vec<Candle>, ExchangeError> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(body)
            .map_err(|e| ExchangeError::Unexpected(format!("klines payload is not an array of rows: {e}")))?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() < 6 {
                    return Err(ExchangeError::Unexpected(format!(
                        "kline row {i} has {} fields, expected at least 6",
                        row.len()
                    )));
                }
                let open_time = row[0].as_i64().ok_or_else(|| {
                    ExchangeError::Unexpected(format!("kline row {i}: open time is not an integer"))
                })?;
                let num = |idx: usize, name: &str| {
                    decimal(&row[idx]).ok_or_else(|| {
                        ExchangeError::Unexpected(format!("kline row {i}: {name} is not a number"))
                    })
                };
                Candle::from_millis(
                    open_time,
                    num(1, "open")?,
                    num(2, "high")?,
                    num(3, "low")?,
                    num(4, "close")?,
                    num(5, "volume")?,
                )
                .ok_or_else(|| {
                    ExchangeError::Unexpected(format!("kline row {i}: open time {open_time} out of range"))
                })
            })
            .collect()
    }
}

/// Binance sends prices as strings; accept bare numbers too.
fn decimal(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

impl Exchange for BinanceUs {
    fn name(&self) -> &str {
        "binanceus"
    }

    fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let market = Self::market_id(symbol)?;
        let limit = limit.clamp(1, MAX_KLINES_LIMIT).to_string();
        let since = since_ms.to_string();

        let resp = self
            .client
            .get(self.klines_url.clone())
            .query(&[
                ("symbol", market.as_str()),
                ("interval", timeframe.as_str()),
                ("startTime", since.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| Self::classify_transport(&e))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| match Self::classify_transport(&e) {
                ExchangeError::Network(msg) => {
                    ExchangeError::Network(format!("failed to read response body: {msg}"))
                }
                other => other,
            })?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body, symbol));
        }

        let mut candles = Self::parse_klines(&body)?;
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}
