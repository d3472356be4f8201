//! Domain types for candlekit

pub mod candle;
pub mod time;
pub mod timeframe;

pub use candle::Candle;
pub use time::{format_timestamp, parse_timestamp, TimestampError};
pub use timeframe::{Timeframe, TimeframeError};
