//! Watch mode: re-fetch and re-display a ticker on a fixed interval.

use crate::report;
use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use crypto_fetcher_core::{output, ExchangeClient, ExchangeRegistry, OutputFormat};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    client: Arc<dyn ExchangeClient>,
    registry: &ExchangeRegistry,
    symbol: &str,
    format: OutputFormat,
    output_path: Option<&Path>,
    interval_secs: u64,
) -> Result<()> {
    println!(
        "{}",
        format!(
            "👀 Watching {} on {} (updating every {}s)",
            symbol,
            client.name(),
            interval_secs
        )
        .green()
    );
    println!("{}", "Press Ctrl+C to stop".dimmed());

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "⏹️  Stopped watching".yellow());
                return Ok(());
            }
            _ = interval.tick() => {
                match client.fetch_ticker(symbol).await {
                    Ok(ticker) => {
                        let rendered = output::format_ticker(format, &ticker)?;

                        clear_screen();
                        println!(
                            "{}",
                            format!("🚀 Crypto Fetcher - {} on {}", symbol, client.name())
                                .blue()
                                .bold()
                        );
                        println!(
                            "{}",
                            format!("Last updated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
                                .dimmed()
                        );
                        println!("{rendered}");

                        if let Some(path) = output_path {
                            std::fs::write(path, &rendered)?;
                        }
                    }
                    Err(e) => {
                        report::print_friendly(&e, registry);
                    }
                }
            }
        }
    }
}

fn clear_screen() {
    print!("\x1b[2J\x1b[1;1H");
}
