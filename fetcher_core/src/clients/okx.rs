//! OKX API Client
//!
//! Market data from the OKX v5 public API. No API key required.
//! Every response carries a `{"code": "0", "msg": "", "data": [...]}`
//! envelope; candle rows arrive newest first.

use super::{check_status, split_symbol, ClientOptions, ExchangeClient};
use crate::error::{FetchError, Result};
use crate::models::{iso8601, Candle, Ticker, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://www.okx.com";
const NAME: &str = "OKX";
const MAX_CANDLE_LIMIT: u32 = 300;

#[derive(Debug)]
pub struct OkxClient {
    client: Client,
}

impl OkxClient {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            client: options.build_http(),
        }
    }

    fn bar(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::Min1 => "1m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Min30 => "30m",
            Timeframe::Hour1 => "1H",
            Timeframe::Hour4 => "4H",
            Timeframe::Day1 => "1D",
            Timeframe::Week1 => "1W",
        }
    }

    fn check_envelope<T>(symbol: &str, envelope: &OkxResponse<T>) -> Result<()> {
        if envelope.code == "0" {
            return Ok(());
        }
        // 51001: instrument does not exist
        if envelope.code == "51001" || envelope.msg.contains("doesn't exist") {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            });
        }
        Err(FetchError::Api {
            exchange: NAME,
            status: 200,
            message: format!("code={}, message={}", envelope.code, envelope.msg),
        })
    }
}

#[async_trait]
impl ExchangeClient for OkxClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn market_id(&self, symbol: &str) -> String {
        let (base, quote) = split_symbol(symbol);
        format!("{}-{}", base, quote)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let inst_id = self.market_id(symbol);
        let url = format!("{}/api/v5/market/ticker?instId={}", BASE_URL, inst_id);

        debug!("Fetching {} from OKX", inst_id);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: OkxResponse<OkxTicker> = response.json().await?;
        Self::check_envelope(symbol, &envelope)?;

        let data = envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
                exchange: NAME,
            })?;

        let last = num(&data.last);
        let open = num(&data.open_24h);
        let change = match (last, open) {
            (Some(l), Some(o)) => Some(l - o),
            _ => None,
        };
        let percentage = match (change, open) {
            (Some(c), Some(o)) if o != 0.0 => Some(c / o * 100.0),
            _ => None,
        };
        let timestamp = num_i64(&data.ts);

        Ok(Ticker {
            symbol: symbol.to_uppercase(),
            last,
            bid: num(&data.bid_px),
            ask: num(&data.ask_px),
            high: num(&data.high_24h),
            low: num(&data.low_24h),
            volume: num(&data.vol_24h),
            quote_volume: num(&data.vol_ccy_24h),
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
        let inst_id = self.market_id(symbol);
        let url = format!(
            "{}/api/v5/market/candles?instId={}&bar={}&limit={}",
            BASE_URL,
            inst_id,
            Self::bar(timeframe),
            limit.min(MAX_CANDLE_LIMIT)
        );

        debug!("Fetching {} candles for {} from OKX", timeframe, inst_id);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: OkxResponse<Vec<String>> = response.json().await?;
        Self::check_envelope(symbol, &envelope)?;

        // Rows: [ts, open, high, low, close, vol, volCcy, ...], newest first.
        let mut candles: Vec<Candle> = envelope
            .data
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
        let url = format!("{}/api/v5/public/instruments?instType=SPOT", BASE_URL);

        let response = self.client.get(&url).send().await?;
        let response = check_status(NAME, response).await?;

        let envelope: OkxResponse<OkxInstrument> = response.json().await?;
        Self::check_envelope("", &envelope)?;

        Ok(envelope
            .data
            .into_iter()
            .filter(|i| i.state == "live")
            .map(|i| format!("{}/{}", i.base_ccy, i.quote_ccy))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct OkxResponse<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTicker {
    #[allow(dead_code)]
    inst_id: String,
    last: String,
    bid_px: String,
    ask_px: String,
    open_24h: String,
    high_24h: String,
    low_24h: String,
    /// 24h volume in base currency
    vol_24h: String,
    /// 24h volume in quote currency
    vol_ccy_24h: String,
    ts: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxInstrument {
    #[allow(dead_code)]
    inst_id: String,
    base_ccy: String,
    quote_ccy: String,
    state: String,
}

fn num(s: &str) -> Option<f64> {
    s.parse().ok()
}

fn num_i64(s: &str) -> Option<i64> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OkxClient {
        OkxClient::new(&ClientOptions::default())
    }

    #[test]
    fn test_market_id() {
        let c = client();
        assert_eq!(c.market_id("BTC/USDT"), "BTC-USDT");
        assert_eq!(c.market_id("eth"), "ETH-USDT");
    }

    #[test]
    fn test_bar_codes() {
        assert_eq!(OkxClient::bar(Timeframe::Min30), "30m");
        assert_eq!(OkxClient::bar(Timeframe::Hour1), "1H");
        assert_eq!(OkxClient::bar(Timeframe::Day1), "1D");
    }

    #[test]
    fn test_parse_ticker_envelope() {
        let json = r#"{
            "code": "0",
            "msg": "",
            "data": [{
                "instType": "SPOT",
                "instId": "BTC-USDT",
                "last": "9999.99",
                "lastSz": "0.1",
                "askPx": "9999.99",
                "askSz": "11",
                "bidPx": "9999.98",
                "bidSz": "5",
                "open24h": "9000",
                "high24h": "10000",
                "low24h": "8888.88",
                "volCcy24h": "2222",
                "vol24h": "2222",
                "ts": "1597026383085",
                "sodUtc0": "0.1",
                "sodUtc8": "0.1"
            }]
        }"#;

        let envelope: OkxResponse<OkxTicker> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, "0");
        let data = &envelope.data[0];
        assert_eq!(num(&data.last), Some(9999.99));
        assert_eq!(num_i64(&data.ts), Some(1597026383085));
    }

    #[test]
    fn test_instrument_error_code() {
        let envelope: OkxResponse<OkxTicker> = serde_json::from_str(
            r#"{"code": "51001", "msg": "Instrument ID doesn't exist", "data": []}"#,
        )
        .unwrap();
        let err = OkxClient::check_envelope("NOPE/USDT", &envelope).unwrap_err();
        assert!(matches!(err, FetchError::SymbolNotFound { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_symbols_live() {
        let c = client();
        let symbols = c.fetch_symbols().await.unwrap();
        assert!(symbols.iter().any(|s| s == "BTC/USDT"));
    }
}
