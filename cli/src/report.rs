//! User-facing error reporting.
//!
//! Maps the typed error taxonomy onto short, friendly console messages with
//! a hint line, then lists the available exchanges.

use colored::Colorize;
use crypto_fetcher_core::{ExchangeRegistry, FetchError};

pub fn print_friendly(err: &FetchError, registry: &ExchangeRegistry) {
    match err {
        FetchError::Http(e) => {
            eprintln!("{}", "🌐 Network Error".red());
            if e.is_timeout() {
                eprintln!(
                    "{}",
                    "💡 The exchange did not answer in time; try again or raise FETCHER_TIMEOUT_SECS"
                        .yellow()
                );
            } else {
                eprintln!("{}", "💡 Check your internet connection and try again".yellow());
            }
        }
        FetchError::RateLimited { .. } => {
            eprintln!("{}", "⏱️  Rate Limit Exceeded".red());
            eprintln!("{}", "💡 Please wait a moment and try again".yellow());
        }
        FetchError::SymbolNotFound { symbol, exchange } => {
            eprintln!(
                "{}",
                format!("❌ Symbol '{}' not found on {}", symbol, exchange).red()
            );
            let base = symbol.split('/').next().unwrap_or(symbol.as_str());
            eprintln!(
                "{}",
                format!(
                    "💡 Try: crypto-fetcher symbols --exchange {} --search {}",
                    exchange.to_lowercase(),
                    base
                )
                .yellow()
            );
        }
        FetchError::UnknownExchange { name, available } => {
            eprintln!(
                "{}",
                format!("❌ Exchange '{}' is not available.", name).red()
            );
            eprintln!(
                "{}",
                format!("Available exchanges: {}", available.join(", ")).yellow()
            );
            return;
        }
        FetchError::UnsupportedTimeframe {
            exchange,
            timeframe,
        } => {
            eprintln!(
                "{}",
                format!("❌ {} does not support the {} timeframe", exchange, timeframe).red()
            );
            eprintln!("{}", "💡 Try another timeframe such as 1h or 1d".yellow());
        }
        FetchError::Api { message, .. } => print_api_error(err, message),
        FetchError::Parse { .. } | FetchError::Render { .. } => {
            eprintln!("{}", format!("❌ Error: {}", err).red());
            eprintln!("{}", "💡 Try a different exchange or symbol".yellow());
        }
    }

    eprintln!(
        "{}",
        format!("Available exchanges: {}", registry.names().join(", ")).dimmed()
    );
}

/// Exchanges embed failure causes in free-text bodies; sniff the usual
/// phrases before falling back to the raw error.
fn print_api_error(err: &FetchError, message: &str) {
    let lowered = message.to_lowercase();

    if lowered.contains("authentication") || lowered.contains("api key") {
        eprintln!("{}", "🔐 Authentication Error".red());
        eprintln!("{}", "💡 This exchange may require API credentials".yellow());
    } else if lowered.contains("restricted location") || lowered.contains("geographic") {
        eprintln!("{}", "🌍 Geographic Restriction".red());
        eprintln!(
            "{}",
            "💡 This exchange is not available in your region".yellow()
        );
    } else if lowered.contains("maintenance") || lowered.contains("temporarily unavailable") {
        eprintln!("{}", "🔧 Service Maintenance".red());
        eprintln!(
            "{}",
            "💡 The exchange is temporarily unavailable. Please try later.".yellow()
        );
    } else {
        eprintln!("{}", format!("❌ Error: {}", err).red());
        eprintln!("{}", "💡 Try a different exchange or symbol".yellow());
    }
}
