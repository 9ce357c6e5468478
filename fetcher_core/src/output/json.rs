//! Pretty JSON rendering.

use crate::error::{FetchError, Result};
use crate::models::{Candle, Ticker, TickerResult};
use serde_json::{json, Map, Value};

fn render_err(e: serde_json::Error) -> FetchError {
    FetchError::Render {
        format: "json",
        message: e.to_string(),
    }
}

pub fn ticker(t: &Ticker) -> Result<String> {
    serde_json::to_string_pretty(t).map_err(render_err)
}

pub fn ohlcv(candles: &[Candle]) -> Result<String> {
    serde_json::to_string_pretty(candles).map_err(render_err)
}

/// Batches serialize as a map: symbol -> ticker object or `{"error": ...}`.
pub fn tickers(results: &[TickerResult]) -> Result<String> {
    let mut map = Map::new();
    for r in results {
        let value = match &r.outcome {
            Ok(t) => serde_json::to_value(t).map_err(render_err)?,
            Err(e) => json!({ "error": e.to_string() }),
        };
        map.insert(r.symbol.clone(), value);
    }
    serde_json::to_string_pretty(&Value::Object(map)).map_err(render_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_ticker_round_trips() {
        let rendered = ticker(&fixtures::ticker()).unwrap();
        let parsed: Ticker = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.symbol, "BTC/USDT");
        assert_eq!(parsed.last, Some(50_000.5));
    }

    #[test]
    fn test_ohlcv_is_array() {
        let rendered = ohlcv(&fixtures::candles()).unwrap();
        let parsed: Vec<Candle> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].open, 100.0);
    }

    #[test]
    fn test_batch_keeps_error_entries() {
        let rendered = tickers(&fixtures::batch()).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert!(parsed["BTC/USDT"]["last"].is_number());
        assert!(parsed["NOPE/USDT"]["error"]
            .as_str()
            .unwrap()
            .contains("not found"));
    }
}
