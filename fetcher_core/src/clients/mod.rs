//! Per-exchange REST clients.
//!
//! Defines a common interface for exchange market data clients.
//! Implementations include Binance, Coinbase, Kraken, Bybit, OKX, Huobi
//! and KuCoin, all over public endpoints with no API key.

pub mod binance;
pub mod bybit;
pub mod coinbase;
pub mod huobi;
pub mod kraken;
pub mod kucoin;
pub mod okx;

use crate::error::{FetchError, Result};
use crate::models::{Candle, Ticker, TickerResult, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "crypto-fetcher/0.1";

/// Connection settings shared by every exchange client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    pub(crate) fn build_http(&self) -> Client {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .expect("Failed to create HTTP client")
    }
}

/// Common trait for exchange market data clients.
///
/// Implementations must be Send + Sync for use behind `Arc<dyn _>` in the
/// registry. All network methods return typed `FetchError`s so the CLI can
/// classify failures without string matching.
#[async_trait]
pub trait ExchangeClient: Send + Sync + std::fmt::Debug {
    /// Display name, e.g. "Binance".
    fn name(&self) -> &'static str;

    /// Convert a unified "BASE/QUOTE" symbol to this exchange's pair id.
    ///
    /// Examples:
    /// - Binance: "BTC/USDT" -> "BTCUSDT"
    /// - Coinbase: "BTC/USD" -> "BTC-USD"
    /// - Kraken: "BTC/USDT" -> "XBTUSDT"
    fn market_id(&self, symbol: &str) -> String;

    /// Fetch the current ticker snapshot for a symbol.
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker>;

    /// Fetch historical candles, oldest first, at most `limit` records.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>>;

    /// List the exchange's tradable spot symbols in unified "BASE/QUOTE" form.
    async fn fetch_symbols(&self) -> Result<Vec<String>>;

    /// Fetch tickers for several symbols; a failed symbol is recorded and the
    /// rest of the batch continues.
    async fn fetch_tickers(&self, symbols: &[String]) -> Vec<TickerResult> {
        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let outcome = self.fetch_ticker(symbol).await;
            if let Err(ref e) = outcome {
                warn!("Failed to fetch {} from {}: {}", symbol, self.name(), e);
            }
            results.push(TickerResult {
                symbol: symbol.clone(),
                outcome,
            });
        }
        results
    }

    /// Whether the exchange lists the symbol.
    async fn has_symbol(&self, symbol: &str) -> Result<bool> {
        let symbols = self.fetch_symbols().await?;
        Ok(symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol)))
    }
}

/// Map 429 and non-2xx statuses to typed errors before body parsing.
pub(crate) async fn check_status(
    exchange: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(FetchError::RateLimited { exchange });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Api {
            exchange,
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

/// Split a unified "BASE/QUOTE" symbol; the quote defaults to USDT when the
/// separator is missing, matching how bare assets like "BTC" are commonly
/// passed on the command line.
pub(crate) fn split_symbol(symbol: &str) -> (String, String) {
    match symbol.split_once('/') {
        Some((base, quote)) => (base.to_uppercase(), quote.to_uppercase()),
        None => (symbol.to_uppercase(), "USDT".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_symbol() {
        assert_eq!(
            split_symbol("btc/usdt"),
            ("BTC".to_string(), "USDT".to_string())
        );
        assert_eq!(
            split_symbol("ETH/USD"),
            ("ETH".to_string(), "USD".to_string())
        );
        assert_eq!(split_symbol("sol"), ("SOL".to_string(), "USDT".to_string()));
    }

    #[test]
    fn test_default_options() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(opts.user_agent, DEFAULT_USER_AGENT);
    }
}
