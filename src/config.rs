use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub markets: MarketsConfig,
    pub arbitrage: ArbitrageConfig,
    pub output: OutputConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeConfig {
    pub name: String,
    pub base_url: String,
    pub markets_path: String,
    pub depth_path: String,
    pub request_timeout_seconds: u64,
    pub max_concurrent_depth_requests: usize,
    pub depth_request_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketsConfig {
    pub bridge_asset: String,
    pub local_currency: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArbitrageConfig {
    pub min_profit_percent: String,
    pub min_bridge_quote_volume: String,
    pub min_local_quote_volume: String,
    pub check_interval_seconds: u64,
    pub report_every_cycles: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    pub results_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(
                config::Environment::with_prefix("SCANNER")
                    .prefix_separator("_")
                    .separator("__"),
            );

        // Override output path from environment if present
        if let Ok(results_path) = std::env::var("RESULTS_PATH") {
            settings = settings.set_override("output.results_path", results_path)?;
        }

        // Override exchange URL from environment if present
        if let Ok(base_url) = std::env::var("EXCHANGE_BASE_URL") {
            settings = settings.set_override("exchange.base_url", base_url)?;
        }

        let config: Config = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Type and positivity sanity only; thresholds are parsed again by the evaluator.
    pub fn validate(&self) -> Result<()> {
        if self.exchange.base_url.trim().is_empty() {
            return Err(anyhow!("exchange.base_url must not be empty"));
        }
        if self.exchange.request_timeout_seconds == 0 {
            return Err(anyhow!("exchange.request_timeout_seconds must be positive"));
        }
        if self.exchange.max_concurrent_depth_requests == 0 {
            return Err(anyhow!("exchange.max_concurrent_depth_requests must be positive"));
        }
        if self.markets.bridge_asset.trim().is_empty() || self.markets.local_currency.trim().is_empty() {
            return Err(anyhow!("markets.bridge_asset and markets.local_currency must not be empty"));
        }
        if self.markets.bridge_asset == self.markets.local_currency {
            return Err(anyhow!("bridge asset and local currency must differ"));
        }
        if self.arbitrage.check_interval_seconds == 0 {
            return Err(anyhow!("arbitrage.check_interval_seconds must be positive"));
        }
        if self.output.results_path.as_os_str().is_empty() {
            return Err(anyhow!("output.results_path must not be empty"));
        }

        crate::arbitrage::Thresholds::from_config(&self.arbitrage)?;
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.arbitrage.check_interval_seconds)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        exchange: ExchangeConfig {
            name: "Wallex".to_string(),
            base_url: "https://api.wallex.ir".to_string(),
            markets_path: "/hector/web/v1/markets".to_string(),
            depth_path: "/v1/depth".to_string(),
            request_timeout_seconds: 10,
            max_concurrent_depth_requests: 4,
            depth_request_delay_ms: 0,
        },
        markets: MarketsConfig {
            bridge_asset: "USDT".to_string(),
            local_currency: "TMN".to_string(),
        },
        arbitrage: ArbitrageConfig {
            min_profit_percent: "2.0".to_string(),
            min_bridge_quote_volume: "1000".to_string(),
            min_local_quote_volume: "50000000".to_string(),
            check_interval_seconds: 300,
            report_every_cycles: 12,
        },
        output: OutputConfig {
            results_path: PathBuf::from("results.json"),
        },
        api: ApiConfig {
            bind: "127.0.0.1".to_string(),
            port: 5001,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = test_config();
        config.arbitrage.check_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut config = test_config();
        config.exchange.max_concurrent_depth_requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unparsable_threshold() {
        let mut config = test_config();
        config.arbitrage.min_profit_percent = "two percent".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_identical_assets() {
        let mut config = test_config();
        config.markets.local_currency = "USDT".to_string();
        assert!(config.validate().is_err());
    }
}
