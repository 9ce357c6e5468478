//! Command handlers: resolve the exchange, fetch, render, export.

use crate::cli::{Cli, Command};
use crate::config::FetcherConfig;
use crate::report;
use crate::watch;
use anyhow::{Context, Result};
use colored::Colorize;
use crypto_fetcher_core::{output, ExchangeClient, ExchangeRegistry, FetchError};
use std::path::Path;
use std::sync::Arc;

pub async fn run(args: Cli, config: FetcherConfig) -> Result<()> {
    let registry = ExchangeRegistry::with_defaults(config.client_options());

    match args.command {
        Command::Ticker {
            exchange,
            symbol,
            format,
            output,
            watch,
            interval,
        } => {
            let client = resolve_exchange(&registry, &exchange);
            if watch {
                watch::run(
                    client,
                    &registry,
                    &symbol,
                    format,
                    output.as_deref(),
                    interval,
                )
                .await
            } else {
                match client.fetch_ticker(&symbol).await {
                    Ok(ticker) => {
                        let rendered = output::format_ticker(format, &ticker)?;
                        print_and_save(&rendered, output.as_deref())
                    }
                    Err(e) => fail(&e, &registry),
                }
            }
        }

        Command::History {
            exchange,
            symbol,
            timeframe,
            limit,
            format,
            output,
        } => {
            let client = resolve_exchange(&registry, &exchange);
            match client.fetch_ohlcv(&symbol, timeframe, limit).await {
                Ok(candles) => {
                    let rendered = output::format_ohlcv(format, &candles)?;
                    print_and_save(&rendered, output.as_deref())
                }
                Err(e) => fail(&e, &registry),
            }
        }

        Command::MultiTicker {
            exchange,
            symbols,
            format,
            output,
        } => {
            let client = resolve_exchange(&registry, &exchange);
            let symbol_list: Vec<String> = symbols
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            if symbol_list.is_empty() {
                eprintln!("{}", "❌ No symbols provided".red());
                std::process::exit(1);
            }

            let results = client.fetch_tickers(&symbol_list).await;
            let rendered = output::format_tickers(format, &results)?;
            print_and_save(&rendered, output.as_deref())
        }

        Command::Exchanges => {
            println!("{}", "Available Exchanges:".blue().bold());
            for name in registry.names() {
                println!("  • {}", name);
            }
            Ok(())
        }

        Command::Symbols {
            exchange,
            search,
            limit,
        } => {
            let client = resolve_exchange(&registry, &exchange);
            match client.fetch_symbols().await {
                Ok(mut symbols) => {
                    symbols.sort();
                    list_symbols(&exchange, symbols, search.as_deref(), limit);
                    Ok(())
                }
                Err(e) => fail(&e, &registry),
            }
        }

        Command::Validate { exchange, symbol } => {
            let client = resolve_exchange(&registry, &exchange);
            match client.has_symbol(&symbol).await {
                Ok(true) => {
                    println!(
                        "{}",
                        format!("✅ {} is available on {}", symbol, client.name()).green()
                    );
                    Ok(())
                }
                Ok(false) => {
                    println!(
                        "{}",
                        format!("❌ {} is not available on {}", symbol, client.name()).red()
                    );
                    let base = symbol.split('/').next().unwrap_or(symbol.as_str());
                    println!(
                        "{}",
                        format!(
                            "💡 Try: crypto-fetcher symbols --exchange {} --search {}",
                            exchange, base
                        )
                        .yellow()
                    );
                    std::process::exit(1);
                }
                Err(e) => fail(&e, &registry),
            }
        }
    }
}

/// Look up the exchange or exit after printing the friendly message, so
/// every command checks availability the same way.
fn resolve_exchange(registry: &ExchangeRegistry, name: &str) -> Arc<dyn ExchangeClient> {
    match registry.get_required(name) {
        Ok(client) => client,
        Err(e) => {
            report::print_friendly(&e, registry);
            std::process::exit(1);
        }
    }
}

fn fail(err: &FetchError, registry: &ExchangeRegistry) -> ! {
    report::print_friendly(err, registry);
    std::process::exit(1);
}

fn print_and_save(rendered: &str, path: Option<&Path>) -> Result<()> {
    println!("{rendered}");

    if let Some(path) = path {
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!(
            "{}",
            format!("💾 Data saved to {}", path.display()).green()
        );
    }

    Ok(())
}

fn list_symbols(exchange: &str, symbols: Vec<String>, search: Option<&str>, limit: usize) {
    let filtered: Vec<String> = match search {
        Some(needle) => {
            let needle = needle.to_uppercase();
            symbols
                .into_iter()
                .filter(|s| s.to_uppercase().contains(&needle))
                .collect()
        }
        None => symbols,
    };

    match search {
        Some(needle) => println!(
            "{}",
            format!("🔍 Symbols containing '{}' on {}:", needle, exchange)
                .blue()
                .bold()
        ),
        None => println!(
            "{}",
            format!("📋 Available symbols on {}:", exchange).blue().bold()
        ),
    }

    for symbol in filtered.iter().take(limit) {
        println!("  • {}", symbol);
    }

    if filtered.len() > limit {
        println!(
            "{}",
            format!("... and {} more symbols", filtered.len() - limit).dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_list_splitting() {
        let raw = "BTC/USDT, ETH/USDT ,,SOL/USDT";
        let list: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(list, vec!["BTC/USDT", "ETH/USDT", "SOL/USDT"]);
    }
}
