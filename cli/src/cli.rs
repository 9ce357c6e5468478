//! Command-line surface for crypto-fetcher.

use clap::{Parser, Subcommand};
use crypto_fetcher_core::{OutputFormat, Timeframe};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "crypto-fetcher",
    version,
    about = "A CLI tool to fetch cryptocurrency data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch current ticker data for a trading pair
    Ticker {
        /// Exchange name (e.g. binance, coinbase, kraken)
        #[arg(short, long)]
        exchange: String,

        /// Trading pair symbol (e.g. BTC/USDT)
        #[arg(short, long)]
        symbol: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Save output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Watch mode - continuously update data
        #[arg(short, long)]
        watch: bool,

        /// Update frequency in seconds for watch mode
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },

    /// Fetch historical OHLCV data for a trading pair
    History {
        /// Exchange name
        #[arg(short, long)]
        exchange: String,

        /// Trading pair symbol
        #[arg(short, long)]
        symbol: String,

        /// Candlestick timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w)
        #[arg(short, long, default_value = "1h")]
        timeframe: Timeframe,

        /// Number of records to fetch
        #[arg(short, long, default_value_t = 100)]
        limit: u32,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Save output to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch ticker data for multiple trading pairs
    MultiTicker {
        /// Exchange name
        #[arg(short, long)]
        exchange: String,

        /// Comma-separated list of trading pairs
        #[arg(short, long)]
        symbols: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Save output to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List available exchanges
    Exchanges,

    /// List available trading symbols for an exchange
    Symbols {
        /// Exchange name
        #[arg(short, long)]
        exchange: String,

        /// Search for specific symbols
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of symbols to display
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Validate if a symbol exists on an exchange
    Validate {
        /// Exchange name
        #[arg(short, long)]
        exchange: String,

        /// Trading pair symbol
        #[arg(short, long)]
        symbol: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ticker_command() {
        let cli = Cli::parse_from([
            "crypto-fetcher",
            "ticker",
            "-e",
            "binance",
            "-s",
            "BTC/USDT",
            "-f",
            "json",
            "-w",
            "-i",
            "10",
        ]);
        match cli.command {
            Command::Ticker {
                exchange,
                symbol,
                format,
                watch,
                interval,
                ..
            } => {
                assert_eq!(exchange, "binance");
                assert_eq!(symbol, "BTC/USDT");
                assert_eq!(format, OutputFormat::Json);
                assert!(watch);
                assert_eq!(interval, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_history_defaults() {
        let cli = Cli::parse_from([
            "crypto-fetcher",
            "history",
            "--exchange",
            "kraken",
            "--symbol",
            "BTC/USD",
        ]);
        match cli.command {
            Command::History {
                timeframe,
                limit,
                format,
                ..
            } => {
                assert_eq!(timeframe, Timeframe::Hour1);
                assert_eq!(limit, 100);
                assert_eq!(format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
