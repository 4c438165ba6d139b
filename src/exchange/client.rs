use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    config::ExchangeConfig,
    error::{ScanError, ScanResult},
    exchange::{
        depth::classify_depth_response,
        markets::parse_markets,
        traits::{DepthPriceResolver, MarketDataSource},
    },
    types::{MarketSnapshot, PriceResolution},
};

/// REST client for the exchange's public market-list and depth endpoints.
pub struct ExchangeClient {
    http: Client,
    name: String,
    markets_url: String,
    depth_url: String,
}

impl ExchangeClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        let base_url = config.base_url.trim_end_matches('/');

        info!("Using {} REST API at {}", config.name, base_url);

        Ok(Self {
            http,
            name: config.name.clone(),
            markets_url: format!("{}{}", base_url, config.markets_path),
            depth_url: format!("{}{}", base_url, config.depth_path),
        })
    }

    pub fn markets_url(&self) -> &str {
        &self.markets_url
    }

    pub fn depth_url(&self) -> &str {
        &self.depth_url
    }
}

#[async_trait]
impl MarketDataSource for ExchangeClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_snapshot(&self) -> ScanResult<MarketSnapshot> {
        debug!("Fetching market list from {}", self.markets_url);

        let response = self.http.get(&self.markets_url).send().await.map_err(|e| {
            ScanError::UpstreamUnavailable(format!("market list request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::UpstreamUnavailable(format!(
                "market list returned HTTP {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                ScanError::MalformedResponse(format!("market list is not valid JSON: {}", e))
            } else {
                ScanError::UpstreamUnavailable(format!("market list body read failed: {}", e))
            }
        })?;

        let snapshot = parse_markets(&body)?;
        info!("Fetched {} markets from {}", snapshot.len(), self.name);

        Ok(snapshot)
    }
}

#[async_trait]
impl DepthPriceResolver for ExchangeClient {
    async fn resolve_price(&self, symbol: &str) -> PriceResolution {
        let response = match self
            .http
            .get(&self.depth_url)
            .query(&[("symbol", symbol)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return PriceResolution::TransientError("depth request timed out".to_string())
            }
            Err(e) => {
                return PriceResolution::TransientError(format!("depth request failed: {}", e))
            }
        };

        let status = response.status();
        match response.bytes().await {
            Ok(body) => classify_depth_response(status, &body),
            Err(e) => PriceResolution::TransientError(format!("depth body read failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_endpoint_urls_are_joined_without_double_slash() {
        let mut config = test_config().exchange;
        config.base_url = "https://api.wallex.ir/".to_string();

        let client = ExchangeClient::new(&config).unwrap();
        assert_eq!(client.markets_url(), "https://api.wallex.ir/hector/web/v1/markets");
        assert_eq!(client.depth_url(), "https://api.wallex.ir/v1/depth");
        assert_eq!(client.name(), "Wallex");
    }

    #[tokio::test]
    async fn test_unreachable_exchange_is_upstream_unavailable() {
        let mut config = test_config().exchange;
        // Port 9 (discard) on localhost is expected to refuse connections.
        config.base_url = "http://127.0.0.1:9".to_string();
        config.request_timeout_seconds = 2;

        let client = ExchangeClient::new(&config).unwrap();

        let err = client.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, ScanError::UpstreamUnavailable(_)));

        assert!(matches!(
            client.resolve_price("BTCTMN").await,
            PriceResolution::TransientError(_)
        ));
    }
}
