//! Exchange Registry
//!
//! Manages exchange clients and provides unified access to market data
//! regardless of the underlying exchange.

use crate::clients::{
    binance::BinanceClient, bybit::BybitClient, coinbase::CoinbaseClient, huobi::HuobiClient,
    kraken::KrakenClient, kucoin::KucoinClient, okx::OkxClient, ClientOptions, ExchangeClient,
};
use crate::error::{FetchError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Registry of exchange clients, keyed by lowercase exchange name.
pub struct ExchangeRegistry {
    exchanges: HashMap<String, Arc<dyn ExchangeClient>>,
}

impl ExchangeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            exchanges: HashMap::new(),
        }
    }

    /// Create a registry with every supported exchange registered
    pub fn with_defaults(options: ClientOptions) -> Self {
        let mut registry = Self::new();

        registry.register("binance", Arc::new(BinanceClient::new(&options)));
        registry.register("coinbase", Arc::new(CoinbaseClient::new(&options)));
        registry.register("kraken", Arc::new(KrakenClient::new(&options)));
        registry.register("bybit", Arc::new(BybitClient::new(&options)));
        registry.register("okx", Arc::new(OkxClient::new(&options)));
        registry.register("huobi", Arc::new(HuobiClient::new(&options)));
        registry.register("kucoin", Arc::new(KucoinClient::new(&options)));

        info!(
            "ExchangeRegistry initialized with {} exchanges",
            registry.exchanges.len()
        );

        registry
    }

    /// Register a custom client
    pub fn register(&mut self, key: &str, client: Arc<dyn ExchangeClient>) {
        self.exchanges.insert(key.to_lowercase(), client);
    }

    /// Get the client for an exchange name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn ExchangeClient>> {
        self.exchanges.get(&name.to_lowercase()).cloned()
    }

    /// Get the client for an exchange name, or an error listing valid names
    pub fn get_required(&self, name: &str) -> Result<Arc<dyn ExchangeClient>> {
        self.get(name).ok_or_else(|| FetchError::UnknownExchange {
            name: name.to_string(),
            available: self.names(),
        })
    }

    /// Sorted list of registered exchange names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.exchanges.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an exchange is registered
    pub fn has(&self, name: &str) -> bool {
        self.exchanges.contains_key(&name.to_lowercase())
    }
}

impl Default for ExchangeRegistry {
    fn default() -> Self {
        Self::with_defaults(ClientOptions::default())
    }
}
