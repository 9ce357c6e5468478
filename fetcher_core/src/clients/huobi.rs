//! Huobi (HTX) API Client
//!
//! Market data from the Huobi public API. No API key required.
//! Pair ids are lowercase concatenations ("btcusdt"); errors come back as
//! `{"status": "error", "err-code": ..., "err-msg": ...}` with HTTP 200.

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{iso8601, Candle, Ticker, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.huobi.pro";
const NAME: &str = "Huobi";
const MAX_KLINE_SIZE: u32 = 2000;

#[derive(Debug)]
pub struct HuobiClient {
    client: Client,
}

impl HuobiClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    fn period(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::Min1 => "1min",
            Timeframe::Min5 => "5min",
            Timeframe::Min15 => "15min",
            Timeframe::Min30 => "30min",
            Timeframe::Hour1 => "60min",
            Timeframe::Hour4 => "4hour",
            Timeframe::Day1 => "1day",
            Timeframe::Week1 => "1week",
        }
    }

    fn check_error(symbol: &str, status: &str, err_msg: Option<&str>) -> Result<()> {
        if status == "ok" {
            return Ok(());
        }
        let message = err_msg.unwrap_or("unknown error");
        if message.contains("symbol") {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            });
        }
        Err(FetchError::Api {
            exchange: NAME,
            status: 200,
            message: message.to_string(),
        })
    }
}

#[async_trait]
impl ExchangeClient for HuobiClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!("{}{}", base, quote).to_lowercase()
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let pair = self.market_id(symbol);
        let url = format!("{}/market/detail/merged?symbol={}", BASE_URL, pair);

        debug!("Fetching {} from Huobi", pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: HuobiTickerEnvelope = response.json().await?;
        Self::check_error(symbol, &envelope.status, envelope.err_msg.as_deref())?;

        let tick = envelope.tick.ok_or_else(|| FetchError::Parse {
            exchange: NAME,
            message: "missing tick field".to_string(),
        })?;

        let last = tick.close;
        let change = match (last, tick.open) {
            (Some(l), Some(o)) => Some(l - o),
            _ => None,
        };
        let percentage = match (change, tick.open) {
            (Some(c), Some(o)) if o != 0.0 => Some(c / o * 100.0),
            _ => None,
        };

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last,
            bid: tick.bid.as_ref().and_then(|b| b.first()).copied(),
            ask: tick.ask.as_ref().and_then(|a| a.first()).copied(),
            high: tick.high,
            low: tick.low,
            // amount is base units, vol is quote units on this endpoint
            volume: tick.amount,
            quote_volume: tick.vol,
            change,
            percentage,
            timestamp: envelope.ts,
            datetime: envelope.ts.map(iso8601),
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
            "{}/market/history/kline?symbol={}&period={}&size={}",
            BASE_URL,
            pair,
            Self::period(timeframe),
            limit.min(MAX_KLINE_SIZE)
        );

        debug!("Fetching {} klines for {} from Huobi", timeframe, pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: HuobiDataEnvelope<Vec<HuobiKline>> = response.json().await?;
        Self::check_error(symbol, &envelope.status, envelope.err_msg.as_deref())?;

        // Rows arrive newest first; ids are second-resolution timestamps.
        let mut candles: Vec<Candle> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|k| Candle::new(k.id * 1000, k.open, k.high, k.low, k.close, k.amount))
            .collect();

        candles.reverse();
        Ok(candles)
    }

    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/common/symbols", BASE_URL);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: HuobiDataEnvelope<Vec<HuobiSymbol>> = response.json().await?;
        Self::check_error("", &envelope.status, envelope.err_msg.as_deref())?;

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.state == "online")
            .map(|s| {
                format!(
                    "{}/{}",
                    s.base_currency.to_uppercase(),
                    s.quote_currency.to_uppercase()
                )
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct HuobiTickerEnvelope {
    status: String,
    #[serde(rename = "err-msg")]
    err_msg: Option<String>,
    ts: Option<i64>,
    tick: Option<HuobiTick>,
}

#[derive(Debug, Deserialize)]
struct HuobiTick {
    open: Option<f64>,
    close: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    amount: Option<f64>,
    vol: Option<f64>,
    /// [price, size]
    bid: Option<Vec<f64>>,
    /// [price, size]
    ask: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct HuobiDataEnvelope<T> {
    status: String,
    #[serde(rename = "err-msg")]
    err_msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct HuobiKline {
    /// Candle open time in seconds
    id: i64,
    open: f64,
    close: f64,
    low: f64,
    high: f64,
    /// Volume in base currency units
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct HuobiSymbol {
    #[serde(rename = "base-currency")]
    base_currency: String,
    #[serde(rename = "quote-currency")]
    quote_currency: String,
    state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HuobiClient {
        HuobiClient::new(&ClientOptions::default())
    }

    #[test]
    fn test_market_id_lowercase() {
        let c = client();
        assert_eq!(c.market_id("BTC/USDT"), "btcusdt");
        assert_eq!(c.market_id("ETH"), "ethusdt");
    }

    #[test]
    fn test_period_codes() {
        assert_eq!(HuobiClient::period(Timeframe::Hour1), "60min");
        assert_eq!(HuobiClient::period(Timeframe::Hour4), "4hour");
        assert_eq!(HuobiClient::period(Timeframe::Week1), "1week");
    }

    #[test]
    fn test_parse_merged_ticker() {
        let json = r#"{
            "ch": "market.btcusdt.detail.merged",
            "status": "ok",
            "ts": 1629788763750,
            "tick": {
                "id": 272156789143,
                "version": 272156789143,
                "open": 50080.0,
                "close": 49820.92,
                "low": 48767.0,
                "high": 50500.0,
                "amount": 12055.365781937537,
                "vol": 598742401.992,
                "count": 420573,
                "bid": [49819.48, 2.58112],
                "ask": [49819.49, 0.002]
            }
        }"#;

        let envelope: HuobiTickerEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "ok");
        let tick = envelope.tick.unwrap();
        assert_eq!(tick.close, Some(49820.92));
        assert_eq!(tick.bid.as_ref().and_then(|b| b.first()).copied(), Some(49819.48));
    }

    #[test]
    fn test_invalid_symbol_error() {
        let err = HuobiClient::check_error("NOPE/USDT", "error", Some("invalid symbol"))
            .unwrap_err();
        assert!(matches!(err, FetchError::SymbolNotFound { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_ticker_live() {
        let c = client();
        let ticker = c.fetch_ticker("BTC/USDT").await.unwrap();
        assert_eq!(ticker.source, "Huobi");
        assert!(ticker.last.unwrap() > 0.0);
    }
}
