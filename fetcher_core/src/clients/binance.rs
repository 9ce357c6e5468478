//! Binance API Client
//!
//! Market data from the Binance public API. No API key required.
//!
//! Rate limits: 1200 requests/minute (IP-based)

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{iso8601, Candle, Ticker, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.binance.com/api/v3";
const NAME: &str = "Binance";
const MAX_KLINE_LIMIT: u32 = 1000;

#[derive(Debug)]
pub struct BinanceClient {
    client: Client,
}

impl BinanceClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        // Binance interval codes match the canonical form for the whole set.
        timeframe.as_str()
    }

    fn not_found(symbol: &str, err: FetchError) -> FetchError {
        match err {
            FetchError::Api { message, .. } if message.contains("Invalid symbol") => {
                FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                    exchange: NAME,
                }
            }
            other => other,
        }
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!("{}{}", base, quote)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let pair = self.market_id(symbol);
        let url = format!("{}/ticker/24hr?symbol={}", BASE_URL, pair);

        debug!("Fetching {} from Binance", pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response)
            .await
            .map_err(|e| Self::not_found(symbol, e))?;

        let ticker: Binance24hrTicker = response.json().await?;

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last: num(&ticker.last_price),
            bid: num(&ticker.bid_price),
            ask: num(&ticker.ask_price),
            high: num(&ticker.high_price),
            low: num(&ticker.low_price),
            volume: num(&ticker.volume),
            quote_volume: num(&ticker.quote_volume),
            change: num(&ticker.price_change),
            percentage: num(&ticker.price_change_percent),
            timestamp: Some(ticker.close_time),
            datetime: Some(iso8601(ticker.close_time)),
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
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            BASE_URL,
            pair,
            Self::interval(timeframe),
            limit.min(MAX_KLINE_LIMIT)
        );

        debug!("Fetching {} klines for {} from Binance", timeframe, pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response)
            .await
            .map_err(|e| Self::not_found(symbol, e))?;

        // Kline rows: [open_time, open, high, low, close, volume, close_time, ...]
        let rows: Vec<Vec<serde_json::Value>> = response.json().await?;

        let candles = rows
            .into_iter()
            .filter_map(|row| {
                if row.len() < 6 {
                    return None;
                }
                Some(Candle::new(
                    row[0].as_i64()?,
                    row[1].as_str()?.parse().ok()?,
                    row[2].as_str()?.parse().ok()?,
                    row[3].as_str()?.parse().ok()?,
                    row[4].as_str()?.parse().ok()?,
                    row[5].as_str()?.parse().ok()?,
                ))
            })
            .collect();

        Ok(candles)
    }

    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/exchangeInfo", BASE_URL);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let info: BinanceExchangeInfo = response.json().await?;

        Ok(info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING")
            .map(|s| format!("{}/{}", s.base_asset, s.quote_asset))
            .collect())
    }
}

/// Binance 24hr ticker response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Binance24hrTicker {
    #[allow(dead_code)]
    symbol: String,
    price_change: String,
    price_change_percent: String,
    last_price: String,
    bid_price: String,
    ask_price: String,
    high_price: String,
    low_price: String,
    volume: String,
    quote_volume: String,
    close_time: i64,
}

#[derive(Debug, Deserialize)]
struct BinanceExchangeInfo {
    symbols: Vec<BinanceSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceSymbol {
    #[allow(dead_code)]
    symbol: String,
    base_asset: String,
    quote_asset: String,
    status: String,
}

fn num(s: &str) -> Option<f64> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BinanceClient {
        BinanceClient::new(&ClientOptions::default())
    }

    #[test]
    fn test_market_id() {
        let c = client();
        assert_eq!(c.market_id("BTC/USDT"), "BTCUSDT");
        assert_eq!(c.market_id("eth/usdt"), "ETHUSDT");
        assert_eq!(c.market_id("SOL"), "SOLUSDT");
    }

    #[test]
    fn test_interval_codes() {
        assert_eq!(BinanceClient::interval(Timeframe::Min1), "1m");
        assert_eq!(BinanceClient::interval(Timeframe::Hour4), "4h");
        assert_eq!(BinanceClient::interval(Timeframe::Week1), "1w");
    }

    #[test]
    fn test_parse_24hr_ticker() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "priceChange": "-94.99999800",
            "priceChangePercent": "-0.950",
            "weightedAvgPrice": "0.29628482",
            "prevClosePrice": "0.10002000",
            "lastPrice": "4.00000200",
            "lastQty": "200.00000000",
            "bidPrice": "4.00000000",
            "bidQty": "100.00000000",
            "askPrice": "4.00000200",
            "askQty": "100.00000000",
            "openPrice": "99.00000000",
            "highPrice": "100.00000000",
            "lowPrice": "0.10000000",
            "volume": "8913.30000000",
            "quoteVolume": "15.30000000",
            "openTime": 1499783499040,
            "closeTime": 1499869899040,
            "firstId": 28385,
            "lastId": 28460,
            "count": 76
        }"#;

        let ticker: Binance24hrTicker = serde_json::from_str(json).unwrap();
        assert_eq!(num(&ticker.last_price), Some(4.000002));
        assert_eq!(num(&ticker.price_change_percent), Some(-0.95));
        assert_eq!(ticker.close_time, 1499869899040);
    }

    #[test]
    fn test_parse_exchange_info() {
        let json = r#"{
            "symbols": [
                {"symbol": "BTCUSDT", "baseAsset": "BTC", "quoteAsset": "USDT", "status": "TRADING"},
                {"symbol": "OLDUSDT", "baseAsset": "OLD", "quoteAsset": "USDT", "status": "BREAK"}
            ]
        }"#;

        let info: BinanceExchangeInfo = serde_json::from_str(json).unwrap();
        let listed: Vec<_> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING")
            .collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].base_asset, "BTC");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_ticker_live() {
        let c = client();
        let ticker = c.fetch_ticker("BTC/USDT").await.unwrap();
        assert_eq!(ticker.symbol, "BTC/USDT");
        assert!(ticker.last.unwrap() > 0.0);
        assert_eq!(ticker.source, "Binance");
    }
}
