//! Output rendering for tickers, candles and multi-ticker batches.
//!
//! Each format renders every result shape to a `String` so the CLI can
//! print it, re-print it in watch mode, or write it to a file unchanged.

mod csv;
mod json;
mod table;

use crate::error::Result;
use crate::models::{Candle, Ticker, TickerResult};
use std::fmt;
use std::str::FromStr;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unsupported format '{}' (expected one of: table, json, csv)",
                other
            )),
        }
    }
}

/// Render a single ticker snapshot.
pub fn format_ticker(format: OutputFormat, ticker: &Ticker) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::ticker(ticker)),
        OutputFormat::Json => json::ticker(ticker),
        OutputFormat::Csv => csv::ticker(ticker),
    }
}

/// Render a list of candles.
pub fn format_ohlcv(format: OutputFormat, candles: &[Candle]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::ohlcv(candles)),
        OutputFormat::Json => json::ohlcv(candles),
        OutputFormat::Csv => csv::ohlcv(candles),
    }
}

/// Render a multi-ticker batch, keeping per-symbol errors visible.
pub fn format_tickers(format: OutputFormat, results: &[TickerResult]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::tickers(results)),
        OutputFormat::Json => json::tickers(results),
        OutputFormat::Csv => csv::tickers(results),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::error::FetchError;
    use crate::models::{iso8601, Candle, Ticker, TickerResult};

    pub fn ticker() -> Ticker {
        Ticker {
            symbol: "BTC/USDT".to_string(),
            last: Some(50_000.5),
            bid: Some(49_999.0),
            ask: Some(50_001.0),
            high: Some(51_000.0),
            low: Some(49_000.0),
            volume: Some(1_234.56),
            quote_volume: None,
            change: Some(500.0),
            percentage: Some(1.01),
            timestamp: Some(1_700_000_000_000),
            datetime: Some(iso8601(1_700_000_000_000)),
            source: "Binance".to_string(),
        }
    }

    pub fn candles() -> Vec<Candle> {
        vec![
            Candle::new(1_700_000_000_000, 100.0, 110.0, 90.0, 105.0, 12.5),
            Candle::new(1_700_003_600_000, 105.0, 120.0, 104.0, 118.0, 20.0),
        ]
    }

    pub fn batch() -> Vec<TickerResult> {
        vec![
            TickerResult {
                symbol: "BTC/USDT".to_string(),
                outcome: Ok(ticker()),
            },
            TickerResult {
                symbol: "NOPE/USDT".to_string(),
                outcome: Err(FetchError::SymbolNotFound {
                    symbol: "NOPE/USDT".to_string(),
                    exchange: "Binance",
                }),
            },
        ]
    }
}
