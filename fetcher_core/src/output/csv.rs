//! CSV rendering into an in-memory buffer.

use crate::error::{FetchError, Result};
use crate::models::{Candle, Ticker, TickerResult};

const TICKER_HEADER: [&str; 12] = [
    "symbol",
    "last",
    "bid",
    "ask",
    "high",
    "low",
    "volume",
    "quote_volume",
    "change",
    "percentage",
    "datetime",
    "source",
];

fn render_err(message: String) -> FetchError {
    FetchError::Render {
        format: "csv",
        message,
    }
}

/// Missing values become empty cells, matching how spreadsheet tools expect
/// absent data.
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn ticker_record(t: &Ticker) -> Vec<String> {
    vec![
        t.symbol.clone(),
        cell(t.last),
        cell(t.bid),
        cell(t.ask),
        cell(t.high),
        cell(t.low),
        cell(t.volume),
        cell(t.quote_volume),
        cell(t.change),
        cell(t.percentage),
        t.datetime.clone().unwrap_or_default(),
        t.source.clone(),
    ]
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| render_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| render_err(e.to_string()))
}

pub fn ticker(t: &Ticker) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(TICKER_HEADER)
        .and_then(|_| writer.write_record(ticker_record(t)))
        .map_err(|e| render_err(e.to_string()))?;
    finish(writer)
}

pub fn ohlcv(candles: &[Candle]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["timestamp", "datetime", "open", "high", "low", "close", "volume"])
        .map_err(|e| render_err(e.to_string()))?;

    for c in candles {
        writer
            .write_record([
                c.timestamp.to_string(),
                c.datetime.clone(),
                c.open.to_string(),
                c.high.to_string(),
                c.low.to_string(),
                c.close.to_string(),
                c.volume.to_string(),
            ])
            .map_err(|e| render_err(e.to_string()))?;
    }

    finish(writer)
}

/// Batch rows gain a trailing `error` column; failed symbols keep only their
/// name and the error text.
pub fn tickers(results: &[TickerResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = TICKER_HEADER.to_vec();
    header.push("error");
    writer
        .write_record(&header)
        .map_err(|e| render_err(e.to_string()))?;

    for r in results {
        let record = match &r.outcome {
            Ok(t) => {
                let mut rec = ticker_record(t);
                rec.push(String::new());
                rec
            }
            Err(e) => {
                let mut rec = vec![r.symbol.clone()];
                rec.extend(std::iter::repeat(String::new()).take(TICKER_HEADER.len() - 1));
                rec.push(e.to_string());
                rec
            }
        };
        writer
            .write_record(&record)
            .map_err(|e| render_err(e.to_string()))?;
    }

    finish(writer)
}
