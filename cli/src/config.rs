//! Configuration for the crypto-fetcher CLI

use anyhow::{anyhow, Result};
use crypto_fetcher_core::ClientOptions;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-request timeout for exchange calls
    pub timeout_secs: u64,
    /// User-Agent header sent to exchanges
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn from_env() -> Result<Self> {
        let timeout_secs = parse_u64("FETCHER_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(anyhow!("FETCHER_TIMEOUT_SECS must be > 0"));
        }

        Ok(Self {
            timeout_secs,
            user_agent: env::var("FETCHER_USER_AGENT")
                .unwrap_or_else(|_| "crypto-fetcher/0.1".to_string()),
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_with_default() {
        assert_eq!(parse_u64("NON_EXISTENT_VAR_XYZ", 42).unwrap(), 42);
    }

    #[test]
    fn test_client_options_carry_timeout() {
        let config = FetcherConfig {
            timeout_secs: 7,
            user_agent: "test-agent".to_string(),
        };
        let options = config.client_options();
        assert_eq!(options.timeout, Duration::from_secs(7));
        assert_eq!(options.user_agent, "test-agent");
    }
}
