//! Coinbase Exchange API Client
//!
//! Market data from the Coinbase Exchange public API. No API key required.
//!
//! Rate limits: 10 requests/second (IP-based)

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{iso8601, Candle, Ticker, Timeframe};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.exchange.coinbase.com";
const NAME: &str = "Coinbase";

#[derive(Debug)]
pub struct CoinbaseClient {
    client: Client,
}

impl CoinbaseClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    /// Candle granularity in seconds; Coinbase only serves a fixed set.
    fn granularity(timeframe: Timeframe) -> Option<u32> {
        match timeframe {
            Timeframe::Min1 => Some(60),
            Timeframe::Min5 => Some(300),
            Timeframe::Min15 => Some(900),
            Timeframe::Hour1 => Some(3600),
            Timeframe::Day1 => Some(86400),
            Timeframe::Min30 | Timeframe::Hour4 | Timeframe::Week1 => None,
        }
    }

    fn not_found(symbol: &str, err: FetchError) -> FetchError {
        match err {
            FetchError::Api { status: 404, .. } => FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            },
            other => other,
        }
    }

    /// Fetch 24h stats (open/high/low/volume); best-effort.
    async fn get_stats(&self, product_id: &str) -> Result<CoinbaseStats> {
        let url = format!("{}/products/{}/stats", BASE_URL, product_id);
        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ExchangeClient for CoinbaseClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!("{}-{}", base, quote)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let product_id = self.market_id(symbol);
        let url = format!("{}/products/{}/ticker", BASE_URL, product_id);

        debug!("Fetching {} from Coinbase", product_id);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response)
            .await
            .map_err(|e| Self::not_found(symbol, e))?;

        let ticker: CoinbaseTicker = response.json().await?;

        // 24h figures come from a separate stats endpoint.
        let stats = self.get_stats(&product_id).await.ok();

        let last: Option<f64> = ticker.price.as_deref().and_then(num);
        let open = stats.as_ref().and_then(|s| num(&s.open));
        let change = match (last, open) {
            (Some(l), Some(o)) => Some(l - o),
            _ => None,
        };
        let percentage = match (change, open) {
            (Some(c), Some(o)) if o != 0.0 => Some(c / o * 100.0),
            _ => None,
        };

        let timestamp = ticker
            .time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|dt| dt.timestamp_millis());

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last,
            bid: ticker.bid.as_deref().and_then(num),
            ask: ticker.ask.as_deref().and_then(num),
            high: stats.as_ref().and_then(|s| num(&s.high)),
            low: stats.as_ref().and_then(|s| num(&s.low)),
            volume: stats.as_ref().and_then(|s| num(&s.volume)),
            quote_volume: None,
            change,
            percentage,
            timestamp,
            datetime: timestamp.map(iso8601),
            source: NAME.to_string(),
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let granularity =
            Self::granularity(timeframe).ok_or(FetchError::UnsupportedTimeframe {
                exchange: NAME,
                timeframe,
            })?;

        let product_id = self.market_id(symbol);
        let url = format!(
            "{}/products/{}/candles?granularity={}",
            BASE_URL, product_id, granularity
        );

        debug!("Fetching {} candles for {} from Coinbase", timeframe, product_id);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response)
            .await
            .map_err(|e| Self::not_found(symbol, e))?;

        // Candle rows: [time, low, high, open, close, volume], newest first.
        let rows: Vec<Vec<f64>> = response.json().await?;

        let mut candles: Vec<Candle> = rows
            .into_iter()
            .filter_map(|row| {
                if row.len() < 6 {
                    return None;
                }
                Some(Candle::new(
                    (row[0] as i64) * 1000,
                    row[3],
                    row[2],
                    row[1],
                    row[4],
                    row[5],
                ))
            })
            .rev()
            .collect();

        if candles.len() > limit as usize {
            candles.drain(..candles.len() - limit as usize);
        }

        Ok(candles)
    }

    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/products", BASE_URL);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let products: Vec<CoinbaseProduct> = response.json().await?;

        Ok(products
            .into_iter()
            .filter(|p| p.status == "online")
            .map(|p| format!("{}/{}", p.base_currency, p.quote_currency))
            .collect())
    }
}

/// Coinbase ticker response
#[derive(Debug, Deserialize)]
struct CoinbaseTicker {
    price: Option<String>,
    bid: Option<String>,
    ask: Option<String>,
    time: Option<String>,
}

/// Coinbase 24hr stats response
#[derive(Debug, Deserialize)]
struct CoinbaseStats {
    open: String,
    high: String,
    low: String,
    volume: String,
}

#[derive(Debug, Deserialize)]
struct CoinbaseProduct {
    #[allow(dead_code)]
    id: String,
    base_currency: String,
    quote_currency: String,
    status: String,
}

fn num(s: &str) -> Option<f64> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CoinbaseClient {
        CoinbaseClient::new(&ClientOptions::default())
    }

    #[test]
    fn test_market_id() {
        let c = client();
        assert_eq!(c.market_id("BTC/USD"), "BTC-USD");
        assert_eq!(c.market_id("eth/usd"), "ETH-USD");
        assert_eq!(c.market_id("BTC"), "BTC-USDT");
    }

    #[test]
    fn test_granularity() {
        assert_eq!(CoinbaseClient::granularity(Timeframe::Min1), Some(60));
        assert_eq!(CoinbaseClient::granularity(Timeframe::Day1), Some(86400));
        assert_eq!(CoinbaseClient::granularity(Timeframe::Hour4), None);
        assert_eq!(CoinbaseClient::granularity(Timeframe::Week1), None);
    }

    #[test]
    fn test_parse_ticker() {
        let json = r#"{
            "trade_id": 86326522,
            "price": "6268.48",
            "size": "0.00698254",
            "time": "2020-03-20T00:22:57.833897Z",
            "bid": "6265.15",
            "ask": "6267.71",
            "volume": "53602.03940154"
        }"#;

        let ticker: CoinbaseTicker = serde_json::from_str(json).unwrap();
        assert_eq!(ticker.price.as_deref().and_then(num), Some(6268.48));
        assert!(ticker.time.is_some());
    }

    #[test]
    fn test_candle_row_order() {
        // [time, low, high, open, close, volume]
        let rows = vec![vec![1_700_000_000.0, 1.0, 3.0, 2.0, 2.5, 100.0]];
        let candle = Candle::new(
            (rows[0][0] as i64) * 1000,
            rows[0][3],
            rows[0][2],
            rows[0][1],
            rows[0][4],
            rows[0][5],
        );
        assert_eq!(candle.open, 2.0);
        assert_eq!(candle.high, 3.0);
        assert_eq!(candle.low, 1.0);
        assert_eq!(candle.close, 2.5);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_ticker_live() {
        let c = client();
        let ticker = c.fetch_ticker("BTC/USD").await.unwrap();
        assert_eq!(ticker.source, "Coinbase");
        assert!(ticker.last.unwrap() > 0.0);
    }
}
