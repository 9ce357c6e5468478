//! Error taxonomy for exchange requests and output rendering.

use crate::models::Timeframe;
use thiserror::Error;

/// Errors produced while talking to an exchange or rendering its data.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{exchange} API error: {status} - {message}")]
    Api {
        exchange: &'static str,
        status: u16,
        message: String,
    },

    #[error("{exchange} rate limit exceeded")]
    RateLimited { exchange: &'static str },

    #[error("exchange '{name}' is not available")]
    UnknownExchange {
        name: String,
        available: Vec<String>,
    },

    #[error("symbol '{symbol}' not found on {exchange}")]
    SymbolNotFound {
        symbol: String,
        exchange: &'static str,
    },

    #[error("{exchange} does not support the {timeframe} timeframe")]
    UnsupportedTimeframe {
        exchange: &'static str,
        timeframe: Timeframe,
    },

    #[error("failed to parse {exchange} response: {message}")]
    Parse {
        exchange: &'static str,
        message: String,
    },

    #[error("failed to render {format} output: {message}")]
    Render {
        format: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;
