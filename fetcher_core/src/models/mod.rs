//! Unified market data types.
//!
//! Every exchange client normalizes its responses into these structures so
//! the formatters and the CLI never see exchange-specific payloads.

mod timeframe;

pub use timeframe::Timeframe;

use crate::error::FetchError;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Snapshot of current prices for one trading pair.
///
/// Fields an exchange does not report are `None`; renderers show them as
/// "Not available" instead of inventing zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// Unified symbol, e.g. "BTC/USDT"
    pub symbol: String,
    pub last: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    /// 24-hour high
    pub high: Option<f64>,
    /// 24-hour low
    pub low: Option<f64>,
    /// 24-hour volume in base currency units
    pub volume: Option<f64>,
    /// 24-hour volume in quote currency units
    pub quote_volume: Option<f64>,
    /// Absolute price change over 24 hours
    pub change: Option<f64>,
    /// Percentage price change over 24 hours
    pub percentage: Option<f64>,
    /// Exchange timestamp in milliseconds
    pub timestamp: Option<i64>,
    /// RFC 3339 rendering of `timestamp`
    pub datetime: Option<String>,
    /// Exchange that produced the snapshot
    pub source: String,
}

/// One OHLCV candle, timestamped in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub datetime: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            datetime: iso8601(timestamp),
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Outcome of one symbol in a multi-ticker batch.
///
/// A failed symbol keeps its error so renderers can emit an ERROR row while
/// the rest of the batch still displays.
#[derive(Debug)]
pub struct TickerResult {
    pub symbol: String,
    pub outcome: Result<Ticker, FetchError>,
}

/// Render a millisecond timestamp as RFC 3339, empty when out of range.
pub fn iso8601(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_datetime() {
        let candle = Candle::new(1_700_000_000_000, 1.0, 2.0, 0.5, 1.5, 100.0);
        assert!(candle.datetime.starts_with("2023-11-14T"));
    }

    #[test]
    fn test_ticker_serialization() {
        let ticker = Ticker {
            symbol: "BTC/USDT".to_string(),
            last: Some(50_000.0),
            bid: Some(49_999.0),
            ask: Some(50_001.0),
            high: Some(51_000.0),
            low: Some(49_000.0),
            volume: Some(1_234.5),
            quote_volume: None,
            change: Some(1_000.0),
            percentage: Some(2.0),
            timestamp: Some(1_700_000_000_000),
            datetime: Some(iso8601(1_700_000_000_000)),
            source: "Binance".to_string(),
        };

        let json = serde_json::to_string(&ticker).unwrap();
        assert!(json.contains("BTC/USDT"));
        assert!(json.contains("50000"));
        assert!(json.contains("\"quote_volume\":null"));
    }
}
