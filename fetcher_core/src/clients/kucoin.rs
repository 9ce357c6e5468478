//! KuCoin API Client
//!
//! Market data from the KuCoin public API. No API key required.
//! Responses use a `{"code": "200000", "data": ...}` envelope. Candle rows
//! are [time, open, close, high, low, volume, turnover] with timestamps in
//! seconds, newest first. Unknown symbols on the stats endpoint come back
//! as a 200 with null fields, not as an error code.

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{iso8601, Candle, Ticker, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.kucoin.com";
const NAME: &str = "KuCoin";
const OK_CODE: &str = "200000";

#[derive(Debug)]
pub struct KucoinClient {
    client: Client,
}

impl KucoinClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    fn candle_type(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::Min1 => "1min",
            Timeframe::Min5 => "5min",
            Timeframe::Min15 => "15min",
            Timeframe::Min30 => "30min",
            Timeframe::Hour1 => "1hour",
            Timeframe::Hour4 => "4hour",
            Timeframe::Day1 => "1day",
            Timeframe::Week1 => "1week",
        }
    }

    fn check_envelope<T>(symbol: &str, envelope: &KucoinResponse<T>) -> Result<()> {
        if envelope.code == OK_CODE {
            return Ok(());
        }
        let message = envelope.msg.clone().unwrap_or_default();
        if message.to_lowercase().contains("symbol")
            || message.contains("Unsupported trading pair")
        {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            });
        }
        Err(FetchError::Api {
            exchange: NAME,
            status: 200,
            message: format!("code={}, message={}", envelope.code, message),
        })
    }
}

#[async_trait]
impl ExchangeClient for KucoinClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!("{}-{}", base, quote)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let pair = self.market_id(symbol);
        let url = format!("{}/api/v1/market/stats?symbol={}", BASE_URL, pair);

        debug!("Fetching {} from KuCoin", pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: KucoinResponse<KucoinStats> = response.json().await?;
        Self::check_envelope(symbol, &envelope)?;

        let data = envelope.data.ok_or_else(|| FetchError::Parse {
            exchange: NAME,
            message: "missing data field".to_string(),
        })?;

        // Unknown symbols yield a 200 envelope with null stats.
        let last = data.last.as_deref().and_then(num);
        if last.is_none() && data.high.is_none() && data.low.is_none() {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            });
        }

        // changeRate is a ratio, e.g. "0.0153" for +1.53%.
        let percentage = data
            .change_rate
            .as_deref()
            .and_then(num)
            .map(|r| r * 100.0);

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last,
            bid: data.buy.as_deref().and_then(num),
            ask: data.sell.as_deref().and_then(num),
            high: data.high.as_deref().and_then(num),
            low: data.low.as_deref().and_then(num),
            volume: data.vol.as_deref().and_then(num),
            quote_volume: data.vol_value.as_deref().and_then(num),
            change: data.change_price.as_deref().and_then(num),
            percentage,
            timestamp: data.time,
            datetime: data.time.map(iso8601),
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
            "{}/api/v1/market/candles?type={}&symbol={}",
            BASE_URL,
            Self::candle_type(timeframe),
            pair
        );

        debug!("Fetching {} candles for {} from KuCoin", timeframe, pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: KucoinResponse<Vec<Vec<String>>> = response.json().await?;
        Self::check_envelope(symbol, &envelope)?;

        // Rows: [time, open, close, high, low, volume, turnover], newest first.
        let mut candles: Vec<Candle> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                if row.len() < 6 {
                    return None;
                }
                Some(Candle::new(
                    row[0].parse::<i64>().ok()? * 1000,
                    row[1].parse().ok()?,
                    row[3].parse().ok()?,
                    row[4].parse().ok()?,
                    row[2].parse().ok()?,
                    row[5].parse().ok()?,
                ))
            })
            .collect();

        candles.reverse();
        // Keep the most recent candles when the exchange returned more.
        let extra = candles.len().saturating_sub(limit as usize);
        if extra > 0 {
            candles.drain(..extra);
        }

        Ok(candles)
    }

    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/v2/symbols", BASE_URL);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: KucoinResponse<Vec<KucoinSymbol>> = response.json().await?;
        Self::check_envelope("", &envelope)?;

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.enable_trading)
            .map(|s| format!("{}/{}", s.base_currency, s.quote_currency))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct KucoinResponse<T> {
    code: String,
    msg: Option<String>,
    data: Option<T>,
}

/// KuCoin 24hr stats response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinStats {
    #[allow(dead_code)]
    symbol: Option<String>,
    high: Option<String>,
    low: Option<String>,
    last: Option<String>,
    buy: Option<String>,
    sell: Option<String>,
    change_price: Option<String>,
    change_rate: Option<String>,
    vol: Option<String>,
    vol_value: Option<String>,
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinSymbol {
    #[allow(dead_code)]
    symbol: String,
    base_currency: String,
    quote_currency: String,
    enable_trading: bool,
}

fn num(s: &str) -> Option<f64> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> KucoinClient {
        KucoinClient::new(&ClientOptions::default())
    }

    #[test]
    fn test_market_id() {
        let c = client();
        assert_eq!(c.market_id("BTC/USDT"), "BTC-USDT");
        assert_eq!(c.market_id("kcs"), "KCS-USDT");
    }

    #[test]
    fn test_candle_type_codes() {
        assert_eq!(KucoinClient::candle_type(Timeframe::Hour1), "1hour");
        assert_eq!(KucoinClient::candle_type(Timeframe::Day1), "1day");
    }

    #[test]
    fn test_parse_stats() {
        let json = r#"{
            "code": "200000",
            "data": {
                "time": 1602832092060,
                "symbol": "BTC-USDT",
                "buy": "11328.9",
                "sell": "11329",
                "changeRate": "-0.0055",
                "changePrice": "-63.6",
                "high": "11610",
                "low": "11200",
                "vol": "2282.70993217",
                "volValue": "25984946.157790430",
                "last": "11328.9",
                "averagePrice": "11360.66065903",
                "takerFeeRate": "0.001",
                "makerFeeRate": "0.001"
            }
        }"#;

        let envelope: KucoinResponse<KucoinStats> = serde_json::from_str(json).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.last.as_deref().and_then(num), Some(11328.9));
        assert_eq!(
            data.change_rate.as_deref().and_then(num).map(|r| r * 100.0),
            Some(-0.55)
        );
    }

    #[test]
    fn test_null_stats_means_unknown_symbol() {
        let json = r#"{
            "code": "200000",
            "data": {
                "time": 1602832092060,
                "symbol": "NOPE-USDT",
                "buy": null,
                "sell": null,
                "changeRate": null,
                "changePrice": null,
                "high": null,
                "low": null,
                "vol": null,
                "volValue": null,
                "last": null
            }
        }"#;

        let envelope: KucoinResponse<KucoinStats> = serde_json::from_str(json).unwrap();
        let data = envelope.data.unwrap();
        assert!(data.last.is_none());
        assert!(data.high.is_none());
    }

    #[test]
    fn test_candle_column_order() {
        // [time, open, close, high, low, volume, turnover]
        let row = [
            "1602832560", "11329.1", "11328.9", "11329.2", "11328.0", "0.813", "9210.3",
        ];
        let candle = Candle::new(
            row[0].parse::<i64>().unwrap() * 1000,
            row[1].parse().unwrap(),
            row[3].parse().unwrap(),
            row[4].parse().unwrap(),
            row[2].parse().unwrap(),
            row[5].parse().unwrap(),
        );
        assert_eq!(candle.open, 11329.1);
        assert_eq!(candle.close, 11328.9);
        assert_eq!(candle.high, 11329.2);
        assert_eq!(candle.low, 11328.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_ticker_live() {
        let c = client();
        let ticker = c.fetch_ticker("BTC/USDT").await.unwrap();
        assert_eq!(ticker.source, "KuCoin");
        assert!(ticker.last.unwrap() > 0.0);
    }
}
