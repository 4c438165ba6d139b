use async_trait::async_trait;

use crate::{
    error::ScanResult,
    types::{MarketSnapshot, PriceResolution},
};

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_snapshot(&self) -> ScanResult<MarketSnapshot>;
}

#[async_trait]
pub trait DepthPriceResolver: Send + Sync {
    async fn resolve_price(&self, symbol: &str) -> PriceResolution;
}
