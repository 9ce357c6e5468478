//! Bybit API Client
//!
//! Market data from the Bybit v5 public API, spot category. No API key
//! required. Bybit wraps responses in `{"retCode": 0, "retMsg": "OK",
//! "result": ...}` and returns kline rows newest first.

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{Candle, Ticker, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.bybit.com";
const NAME: &str = "Bybit";
const MAX_KLINE_LIMIT: u32 = 1000;

#[derive(Debug)]
pub struct BybitClient {
    client: Client,
}

impl BybitClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::Min1 => "1",
            Timeframe::Min5 => "5",
            Timeframe::Min15 => "15",
            Timeframe::Min30 => "30",
            Timeframe::Hour1 => "60",
            Timeframe::Hour4 => "240",
            Timeframe::Day1 => "D",
            Timeframe::Week1 => "W",
        }
    }

    fn check_envelope<T>(symbol: &str, envelope: &BybitResponse<T>) -> Result<()> {
        if envelope.ret_code == 0 {
            return Ok(());
        }
        if envelope.ret_msg.to_lowercase().contains("symbol") {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            });
        }
        Err(FetchError::Api {
            exchange: NAME,
            status: 200,
            message: format!("code={}, message={}", envelope.ret_code, envelope.ret_msg),
        })
    }
}

#[async_trait]
impl ExchangeClient for BybitClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!("{}{}", base, quote)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let pair = self.market_id(symbol);
        let url = format!(
            "{}/v5/market/tickers?category=spot&symbol={}",
            BASE_URL, pair
        );

        debug!("Fetching {} from Bybit", pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: BybitResponse<BybitTickerResult> = response.json().await?;
        Self::check_envelope(symbol, &envelope)?;

        let data = envelope
            .result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            })?;

        let last = num(&data.last_price);
        let prev = num(&data.prev_price_24h);
        let change = match (last, prev) {
            (Some(l), Some(p)) => Some(l - p),
            _ => None,
        };
        // price24hPcnt is a ratio, e.g. "0.0153" for +1.53%.
        let percentage = num(&data.price_24h_pcnt).map(|p| p * 100.0);

        let now = chrono::Utc::now();

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last,
            bid: num(&data.bid1_price),
            ask: num(&data.ask1_price),
            high: num(&data.high_price_24h),
            low: num(&data.low_price_24h),
            volume: num(&data.volume_24h),
            quote_volume: num(&data.turnover_24h),
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
        let url = format!(
            "{}/v5/market/kline?category=spot&symbol={}&interval={}&limit={}",
            BASE_URL,
            pair,
            Self::interval(timeframe),
            limit.min(MAX_KLINE_LIMIT)
        );

        debug!("Fetching {} klines for {} from Bybit", timeframe, pair);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: BybitResponse<BybitKlineResult> = response.json().await?;
        Self::check_envelope(symbol, &envelope)?;

        // Rows: [startTime, open, high, low, close, volume, turnover], newest first.
        let mut candles: Vec<Candle> = envelope
            .result
            .list
            .into_iter()
            .filter_map(|row| {
                if row.len() < 6 {
                    return None;
                }
                Some(Candle::new(
                    row[0].parse().ok()?,
                    row[1].parse().ok()?,
                    row[2].parse().ok()?,
                    row[3].parse().ok()?,
                    row[4].parse().ok()?,
                    row[5].parse().ok()?,
                ))
            })
            .collect();

        candles.reverse();
        Ok(candles)
    }

    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        let url = format!(
            "{}/v5/market/instruments-info?category=spot&limit=1000",
            BASE_URL
        );

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: BybitResponse<BybitInstrumentsResult> = response.json().await?;
        Self::check_envelope("", &envelope)?;

        Ok(envelope
            .result
            .list
            .into_iter()
            .filter(|i| i.status == "Trading")
            .map(|i| format!("{}/{}", i.base_coin, i.quote_coin))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    ret_code: i32,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: T,
}

#[derive(Debug, Deserialize)]
struct BybitTickerResult {
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    #[allow(dead_code)]
    symbol: String,
    last_price: String,
    bid1_price: String,
    ask1_price: String,
    high_price_24h: String,
    low_price_24h: String,
    prev_price_24h: String,
    price_24h_pcnt: String,
    volume_24h: String,
    turnover_24h: String,
}

#[derive(Debug, Deserialize)]
struct BybitKlineResult {
    list: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct BybitInstrumentsResult {
    list: Vec<BybitInstrument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitInstrument {
    #[allow(dead_code)]
    symbol: String,
    base_coin: String,
    quote_coin: String,
    status: String,
}

fn num(s: &str) -> Option<f64> {
    s.parse().ok()
}
