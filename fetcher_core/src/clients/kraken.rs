//! Kraken API Client
//!
//! Market data from the Kraken public API. No API key required.
//!
//! Kraken wraps every response in `{"error": [...], "result": {...}}` and
//! keys ticker/OHLC results by its own pair id, so parsing goes through a
//! shared envelope helper. Bitcoin is "XBT" in Kraken pair ids.

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{Candle, Ticker, Timeframe};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const BASE_URL: &str = "https://api.kraken.com/0/public";
const NAME: &str = "Kraken";

#[derive(Debug)]
pub struct KrakenClient {
    client: Client,
}

impl KrakenClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    fn to_kraken_asset(asset: &str) -> &str {
        match asset {
            "BTC" => "XBT",
            other => other,
        }
    }

    fn from_kraken_asset(asset: &str) -> &str {
        match asset {
            "XBT" => "BTC",
            other => other,
        }
    }

    /// Unwrap the Kraken envelope, mapping its error strings to typed errors.
    fn unwrap_envelope<T>(symbol: &str, envelope: KrakenResponse<T>) -> Result<T> {
        if let Some(err) = envelope.error.first() {
            if err.contains("Unknown asset pair") {
                return Err(FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                    exchange: NAME,
                });
            }
            return Err(FetchError::Api {
                exchange: NAME,
                status: 200,
                message: envelope.error.join("; "),
            });
        }
        envelope.result.ok_or_else(|| FetchError::Parse {
            exchange: NAME,
            message: "missing result field".to_string(),
        })
    }
}

#[async_trait]
impl ExchangeClient for KrakenClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!(
            "{}{}",
            Self::to_kraken_asset(&base),
            Self::to_kraken_asset(&quote)
        )
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let pair = self.market_id(symbol);
        let url = format!("{}/Ticker?pair={}", BASE_URL, pair);

        debug!("Fetching {} from Kraken", pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: KrakenResponse<HashMap<String, KrakenTickerData>> =
            response.json().await?;
        let result = Self::unwrap_envelope(symbol, envelope)?;

        let data = result.into_values().next().ok_or_else(|| FetchError::Parse {
            exchange: NAME,
            message: "empty ticker result".to_string(),
        })?;

        let last = data.c.as_ref().and_then(|c| c.first()).and_then(|v| num(v));
        let open = data.o.as_deref().and_then(num);
        let change = match (last, open) {
            (Some(l), Some(o)) => Some(l - o),
            _ => None,
        };
        let percentage = match (change, open) {
            (Some(c), Some(o)) if o != 0.0 => Some(c / o * 100.0),
            _ => None,
        };

        // Kraken has no server timestamp on this endpoint.
        let now = Utc::now();

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last,
            bid: data.b.as_ref().and_then(|b| b.first()).and_then(|v| num(v)),
            ask: data.a.as_ref().and_then(|a| a.first()).and_then(|v| num(v)),
            // h/l arrays are [today, last 24 hours]
            high: data.h.as_ref().and_then(|h| h.get(1)).and_then(|v| num(v)),
            low: data.l.as_ref().and_then(|l| l.get(1)).and_then(|v| num(v)),
            volume: data.v.as_ref().and_then(|v| v.get(1)).and_then(|x| num(x)),
            quote_volume: None,
            change,
            percentage,
            timestamp: Some(now.timestamp_millis()),
            datetime: Some(now.to_rfc3339()),
            source: NAME.to_string(),
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let pair = self.market_id(symbol);
        // Kraken's interval parameter is the candle length in minutes.
        let url = format!(
            "{}/OHLC?pair={}&interval={}",
            BASE_URL,
            pair,
            timeframe.minutes()
        );

        debug!("Fetching {} OHLC for {} from Kraken", timeframe, pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: KrakenResponse<HashMap<String, serde_json::Value>> =
            response.json().await?;
        let result = Self::unwrap_envelope(symbol, envelope)?;

        // The result maps the pair id to rows plus a "last" cursor entry.
        let rows = result
            .iter()
            .find(|(key, _)| key.as_str() != "last")
            .and_then(|(_, value)| value.as_array())
            .ok_or_else(|| FetchError::Parse {
                exchange: NAME,
                message: "missing OHLC rows".to_string(),
            })?;

        // Rows: [time, open, high, low, close, vwap, volume, count], ascending.
        let mut candles: Vec<Candle> = rows
            .iter()
            .filter_map(|row| {
                let row = row.as_array()?;
                if row.len() < 7 {
                    return None;
                }
                Some(Candle::new(
                    row[0].as_i64()? * 1000,
                    row[1].as_str()?.parse().ok()?,
                    row[2].as_str()?.parse().ok()?,
                    row[3].as_str()?.parse().ok()?,
                    row[4].as_str()?.parse().ok()?,
                    row[6].as_str()?.parse().ok()?,
                ))
            })
            .collect();

        if candles.len() > limit as usize {
            candles.drain(..candles.len() - limit as usize);
        }

        Ok(candles)
    }

    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/AssetPairs", BASE_URL);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: KrakenResponse<HashMap<String, KrakenPairInfo>> =
            response.json().await?;
        let result = Self::unwrap_envelope("", envelope)?;

        Ok(result
            .into_values()
            .filter_map(|pair| {
                let wsname = pair.wsname?;
                let (base, quote) = wsname.split_once('/')?;
                Some(format!(
                    "{}/{}",
                    Self::from_kraken_asset(base),
                    Self::from_kraken_asset(quote)
                ))
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

/// Kraken ticker entry; letter fields follow the API's naming:
/// a = ask, b = bid, c = last trade, h = high, l = low, o = open,
/// v = volume, each as arrays of decimal strings.
#[derive(Debug, Deserialize)]
struct KrakenTickerData {
    a: Option<Vec<String>>,
    b: Option<Vec<String>>,
    c: Option<Vec<String>>,
    h: Option<Vec<String>>,
    l: Option<Vec<String>>,
    o: Option<String>,
    v: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct KrakenPairInfo {
    wsname: Option<String>,
}

fn num(s: &str) -> Option<f64> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> KrakenClient {
        KrakenClient::new(&ClientOptions::default())
    }

    #[test]
    fn test_market_id_maps_xbt() {
        let c = client();
        assert_eq!(c.market_id("BTC/USDT"), "XBTUSDT");
        assert_eq!(c.market_id("eth/usd"), "ETHUSD");
        assert_eq!(c.market_id("BTC"), "XBTUSDT");
    }

    #[test]
    fn test_unknown_pair_maps_to_symbol_not_found() {
        let envelope: KrakenResponse<HashMap<String, KrakenTickerData>> =
            serde_json::from_str(r#"{"error": ["EQuery:Unknown asset pair"]}"#).unwrap();
        let err = KrakenClient::unwrap_envelope("NOPE/USD", envelope).unwrap_err();
        assert!(matches!(err, FetchError::SymbolNotFound { .. }));
    }

    #[test]
    fn test_parse_ticker_entry() {
        let json = r#"{
            "error": [],
            "result": {
                "XXBTZUSD": {
                    "a": ["30300.10000", "1", "1.000"],
                    "b": ["30300.00000", "1", "1.000"],
                    "c": ["30303.20000", "0.00067643"],
                    "v": ["4083.67001100", "4412.73601799"],
                    "p": ["30706.77771", "30689.13205"],
                    "t": [34619, 38907],
                    "l": ["29868.30000", "29868.30000"],
                    "h": ["31631.00000", "31631.00000"],
                    "o": "30502.80000"
                }
            }
        }"#;

        let envelope: KrakenResponse<HashMap<String, KrakenTickerData>> =
            serde_json::from_str(json).unwrap();
        let result = KrakenClient::unwrap_envelope("BTC/USD", envelope).unwrap();
        let data = result.into_values().next().unwrap();
        assert_eq!(data.c.as_ref().and_then(|c| c.first()).and_then(|v| num(v)), Some(30303.2));
        assert_eq!(data.h.as_ref().and_then(|h| h.get(1)).and_then(|v| num(v)), Some(31631.0));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_ticker_live() {
        let c = client();
        let ticker = c.fetch_ticker("BTC/USD").await.unwrap();
        assert_eq!(ticker.source, "Kraken");
        assert!(ticker.last.unwrap() > 0.0);
    }
}
