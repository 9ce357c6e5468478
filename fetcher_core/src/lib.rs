//! Crypto Fetcher Core - multi-exchange market data access and rendering.
//!
//! This library provides:
//! - Normalized ticker and OHLCV candle types shared across exchanges
//! - Public-endpoint REST clients for Binance, Coinbase, Kraken, Bybit,
//!   OKX, Huobi and KuCoin behind a common `ExchangeClient` trait
//! - A registry that routes requests by exchange name
//! - Table, JSON and CSV renderers for every result shape

pub mod clients;
pub mod error;
pub mod models;
pub mod output;
pub mod registry;

pub use clients::{ClientOptions, ExchangeClient};
pub use error::{FetchError, Result};
pub use models::{Candle, Ticker, TickerResult, Timeframe};
pub use output::OutputFormat;
pub use registry::ExchangeRegistry;
