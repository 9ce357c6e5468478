//! Terminal table rendering via `tabled`.

use crate::models::{Candle, Ticker, TickerResult};
use tabled::{Table, Tabled};

const NOT_AVAILABLE: &str = "Not available";

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn ticker(t: &Ticker) -> String {
    let rows = vec![
        FieldRow {
            field: "Symbol",
            value: t.symbol.clone(),
        },
        FieldRow {
            field: "Last Price",
            value: fmt_price(t.last),
        },
        FieldRow {
            field: "Bid",
            value: fmt_price(t.bid),
        },
        FieldRow {
            field: "Ask",
            value: fmt_price(t.ask),
        },
        FieldRow {
            field: "High",
            value: fmt_price(t.high),
        },
        FieldRow {
            field: "Low",
            value: fmt_price(t.low),
        },
        FieldRow {
            field: "Volume",
            value: fmt_amount(t.volume),
        },
        FieldRow {
            field: "Quote Volume",
            value: fmt_amount(t.quote_volume),
        },
        FieldRow {
            field: "Change",
            value: fmt_price(t.change),
        },
        FieldRow {
            field: "Percentage",
            value: fmt_percent(t.percentage),
        },
        FieldRow {
            field: "Exchange",
            value: t.source.clone(),
        },
        FieldRow {
            field: "Timestamp",
            value: t
                .datetime
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
    ];

    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct CandleRow {
    #[tabled(rename = "DateTime")]
    datetime: String,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Volume")]
    volume: String,
}

pub fn ohlcv(candles: &[Candle]) -> String {
    if candles.is_empty() {
        return "No data available".to_string();
    }

    let rows: Vec<CandleRow> = candles
        .iter()
        .map(|c| CandleRow {
            datetime: c.datetime.clone(),
            open: fmt_price(Some(c.open)),
            high: fmt_price(Some(c.high)),
            low: fmt_price(Some(c.low)),
            close: fmt_price(Some(c.close)),
            volume: fmt_amount(Some(c.volume)),
        })
        .collect();

    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct MultiTickerRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Last Price")]
    last: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Change %")]
    percentage: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    low: String,
}

pub fn tickers(results: &[TickerResult]) -> String {
    let rows: Vec<MultiTickerRow> = results
        .iter()
        .map(|r| match &r.outcome {
            Ok(t) => MultiTickerRow {
                symbol: r.symbol.clone(),
                last: fmt_price(t.last),
                volume: fmt_amount(t.volume),
                percentage: fmt_percent(t.percentage),
                high: fmt_price(t.high),
                low: fmt_price(t.low),
            },
            Err(_) => MultiTickerRow {
                symbol: r.symbol.clone(),
                last: "ERROR".to_string(),
                volume: "-".to_string(),
                percentage: "-".to_string(),
                high: "-".to_string(),
                low: "-".to_string(),
            },
        })
        .collect();

    Table::new(rows).to_string()
}

/// Prices keep 8 decimal places so sub-cent pairs stay readable.
pub(crate) fn fmt_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.8}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Volumes and other large amounts round to 2 decimal places.
pub(crate) fn fmt_amount(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub(crate) fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_number_formatting() {
        assert_eq!(fmt_price(Some(50000.5)), "50000.50000000");
        assert_eq!(fmt_price(None), "Not available");
        assert_eq!(fmt_amount(Some(1234.567)), "1234.57");
        assert_eq!(fmt_percent(Some(-0.5)), "-0.50%");
    }

    #[test]
    fn test_ticker_table_contains_fields() {
        let rendered = ticker(&fixtures::ticker());
        assert!(rendered.contains("BTC/USDT"));
        assert!(rendered.contains("Last Price"));
        assert!(rendered.contains("50000.50000000"));
        assert!(rendered.contains("Not available")); // quote volume is None
    }

    #[test]
    fn test_empty_ohlcv_message() {
        assert_eq!(ohlcv(&[]), "No data available");
    }

    #[test]
    fn test_ohlcv_table_has_one_row_per_candle() {
        let candles = fixtures::candles();
        let rendered = ohlcv(&candles);
        assert!(rendered.contains("DateTime"));
        assert_eq!(
            rendered.matches("2023-11-").count(),
            candles.len(),
            "each candle renders its datetime"
        );
    }

    #[test]
    fn test_batch_table_marks_errors() {
        let rendered = tickers(&fixtures::batch());
        assert!(rendered.contains("ERROR"));
        assert!(rendered.contains("NOPE/USDT"));
        assert!(rendered.contains("BTC/USDT"));
    }
}
