use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use futures::stream::{self, StreamExt};
use std::{str::FromStr, time::Duration};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::{
    arbitrage::calculator::{self, Liquidity},
    config::{ArbitrageConfig, Config, ExchangeConfig, MarketsConfig},
    error::{ScanError, ScanResult},
    exchange::DepthPriceResolver,
    types::{AnalysisResult, MarketSnapshot, Opportunity, PriceResolution, PriceSource},
};

pub const STRATEGY_NAME: &str = "Internal";

/// Liquidity and profitability gates applied to every pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub min_profit_percent: BigDecimal,
    pub min_bridge_quote_volume: BigDecimal,
    pub min_local_quote_volume: BigDecimal,
}

impl Thresholds {
    pub fn from_config(config: &ArbitrageConfig) -> Result<Self> {
        Ok(Self {
            min_profit_percent: parse_threshold("min_profit_percent", &config.min_profit_percent)?,
            min_bridge_quote_volume: parse_threshold(
                "min_bridge_quote_volume",
                &config.min_bridge_quote_volume,
            )?,
            min_local_quote_volume: parse_threshold(
                "min_local_quote_volume",
                &config.min_local_quote_volume,
            )?,
        })
    }
}

fn parse_threshold(name: &str, raw: &str) -> Result<BigDecimal> {
    let value = BigDecimal::from_str(raw.trim()).map_err(|e| anyhow!("Invalid {}: {}", name, e))?;
    if value < BigDecimal::from(0) {
        return Err(anyhow!("{} must not be negative, got {}", name, value));
    }
    Ok(value)
}

/// Pacing of the per-pair depth lookups.
#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    pub max_concurrent_depth_requests: usize,
    pub depth_request_delay: Duration,
    pub depth_request_timeout: Duration,
}

impl EvaluatorOptions {
    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self {
            max_concurrent_depth_requests: config.max_concurrent_depth_requests.max(1),
            depth_request_delay: Duration::from_millis(config.depth_request_delay_ms),
            depth_request_timeout: Duration::from_secs(config.request_timeout_seconds),
        }
    }
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            max_concurrent_depth_requests: 1,
            depth_request_delay: Duration::ZERO,
            depth_request_timeout: Duration::from_secs(10),
        }
    }
}

/// A coin listed against both the bridge asset and the local currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair {
    pub base_asset: String,
    pub bridge_symbol: String,
    pub local_symbol: String,
}

/// Per-cycle counters. "Volume unknown" and "volume below minimum" are kept
/// apart since they mean different things operationally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub pairs_considered: usize,
    pub pairs_without_sibling: usize,
    pub precise_prices: usize,
    pub fallback_prices: usize,
    pub transient_errors: usize,
    pub transient_symbols: Vec<String>,
    pub skipped_without_price: usize,
    pub liquidity_unknown: usize,
    pub liquidity_below_minimum: usize,
    pub below_profit_threshold: usize,
    pub emitted: usize,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: AnalysisResult,
    pub stats: EvaluationStats,
}

pub struct OpportunityEvaluator {
    thresholds: Thresholds,
    options: EvaluatorOptions,
    bridge_asset: String,
    local_currency: String,
    bridge_rate_symbol: String,
    exchange_name: String,
}

impl OpportunityEvaluator {
    pub fn new(config: &Config) -> Result<Self> {
        let thresholds = Thresholds::from_config(&config.arbitrage)?;
        let options = EvaluatorOptions::from_config(&config.exchange);

        Ok(Self::with_parts(
            thresholds,
            options,
            &config.markets,
            &config.exchange.name,
        ))
    }

    pub fn with_parts(
        thresholds: Thresholds,
        options: EvaluatorOptions,
        markets: &MarketsConfig,
        exchange_name: &str,
    ) -> Self {
        let bridge_asset = markets.bridge_asset.trim().to_uppercase();
        let local_currency = markets.local_currency.trim().to_uppercase();

        Self {
            thresholds,
            options,
            bridge_rate_symbol: format!("{}{}", bridge_asset, local_currency),
            bridge_asset,
            local_currency,
            exchange_name: exchange_name.to_string(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn bridge_rate_symbol(&self) -> &str {
        &self.bridge_rate_symbol
    }

    pub async fn evaluate<R>(&self, snapshot: &MarketSnapshot, resolver: &R) -> ScanResult<AnalysisResult>
    where
        R: DepthPriceResolver + ?Sized,
    {
        Ok(self.evaluate_detailed(snapshot, resolver).await?.result)
    }

    pub async fn evaluate_detailed<R>(
        &self,
        snapshot: &MarketSnapshot,
        resolver: &R,
    ) -> ScanResult<Evaluation>
    where
        R: DepthPriceResolver + ?Sized,
    {
        let bridge_rate = self.find_bridge_rate(snapshot)?;
        info!(
            "Using bridge rate {}: {} {}",
            self.bridge_rate_symbol, bridge_rate, self.local_currency
        );

        let mut stats = EvaluationStats::default();
        let pairs = self.candidate_pairs(snapshot, &mut stats);
        stats.pairs_considered = pairs.len();

        // Lookups may complete in any order; `buffered` yields them in pair order.
        let resolutions: Vec<PriceResolution> = stream::iter(pairs.iter())
            .map(|pair| self.resolve_with_limits(resolver, &pair.local_symbol))
            .buffered(self.options.max_concurrent_depth_requests.max(1))
            .collect()
            .await;

        let mut candidates: Vec<(BigDecimal, Opportunity)> = pairs
            .iter()
            .zip(resolutions)
            .filter_map(|(pair, resolution)| {
                self.evaluate_pair(pair, resolution, snapshot, &bridge_rate, &mut stats)
            })
            .collect();

        // Stable: equal spreads keep symbol order.
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        let opportunities: Vec<Opportunity> = candidates.into_iter().map(|(_, opp)| opp).collect();
        stats.emitted = opportunities.len();

        info!(
            "Evaluated {} pairs: {} opportunities, {} fallback prices, {} transient errors",
            stats.pairs_considered, stats.emitted, stats.fallback_prices, stats.transient_errors
        );
        if !stats.transient_symbols.is_empty() {
            warn!(
                "Skipped after transient depth errors: {}",
                stats.transient_symbols.join(", ")
            );
        }

        Ok(Evaluation {
            result: AnalysisResult::new(bridge_rate, opportunities),
            stats,
        })
    }

    pub fn find_bridge_rate(&self, snapshot: &MarketSnapshot) -> ScanResult<BigDecimal> {
        match snapshot.get(&self.bridge_rate_symbol) {
            Some(quote) if quote.last_price > BigDecimal::from(0) => Ok(quote.last_price.clone()),
            _ => Err(ScanError::MissingBridgeRate {
                symbol: self.bridge_rate_symbol.clone(),
            }),
        }
    }

    /// Every `<ASSET><BRIDGE>` market whose `<ASSET><LOCAL>` sibling is also listed.
    pub fn candidate_pairs(
        &self,
        snapshot: &MarketSnapshot,
        stats: &mut EvaluationStats,
    ) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();

        for quote in snapshot.quotes() {
            if quote.symbol == self.bridge_rate_symbol {
                continue;
            }

            let base_asset = match quote.symbol.strip_suffix(self.bridge_asset.as_str()) {
                Some(base) if !base.is_empty() => base,
                _ => continue,
            };

            let local_symbol = format!("{}{}", base_asset, self.local_currency);
            if !snapshot.contains(&local_symbol) {
                stats.pairs_without_sibling += 1;
                continue;
            }

            pairs.push(CandidatePair {
                base_asset: base_asset.to_string(),
                bridge_symbol: quote.symbol.clone(),
                local_symbol,
            });
        }

        pairs
    }

    async fn resolve_with_limits<R>(&self, resolver: &R, symbol: &str) -> PriceResolution
    where
        R: DepthPriceResolver + ?Sized,
    {
        if !self.options.depth_request_delay.is_zero() {
            sleep(self.options.depth_request_delay).await;
        }

        match timeout(self.options.depth_request_timeout, resolver.resolve_price(symbol)).await {
            Ok(resolution) => resolution,
            Err(_) => PriceResolution::TransientError(format!(
                "depth lookup exceeded {:?}",
                self.options.depth_request_timeout
            )),
        }
    }

    fn evaluate_pair(
        &self,
        pair: &CandidatePair,
        resolution: PriceResolution,
        snapshot: &MarketSnapshot,
        bridge_rate: &BigDecimal,
        stats: &mut EvaluationStats,
    ) -> Option<(BigDecimal, Opportunity)> {
        let (bridge_quote, local_quote) = match (
            snapshot.get(&pair.bridge_symbol),
            snapshot.get(&pair.local_symbol),
        ) {
            (Some(bridge), Some(local)) => (bridge, local),
            _ => return None,
        };

        let (entry_price, price_source) = match resolution {
            PriceResolution::TransientError(reason) => {
                let err = ScanError::TransientPairError {
                    symbol: pair.local_symbol.clone(),
                    reason,
                };
                warn!("Skipping pair this cycle: {}", err);
                stats.transient_errors += 1;
                stats.transient_symbols.push(pair.local_symbol.clone());
                return None;
            }
            PriceResolution::Precise(price) if price > BigDecimal::from(0) => {
                stats.precise_prices += 1;
                debug!("Found precise price for {}: {}", pair.local_symbol, price);
                (price, PriceSource::OrderBook)
            }
            PriceResolution::Precise(_) | PriceResolution::Unavailable => {
                if local_quote.last_price > BigDecimal::from(0) {
                    stats.fallback_prices += 1;
                    warn!(
                        "Order book for {} is inactive, using last trade price {}",
                        pair.local_symbol, local_quote.last_price
                    );
                    (local_quote.last_price.clone(), PriceSource::LastTrade)
                } else {
                    stats.skipped_without_price += 1;
                    debug!("No usable entry price for {}", pair.local_symbol);
                    return None;
                }
            }
        };

        let exit_price = calculator::exit_price(&bridge_quote.last_price, bridge_rate);
        let profit_percent = match calculator::profit_percent(&entry_price, &exit_price) {
            Some(percent) => percent,
            None => {
                stats.skipped_without_price += 1;
                return None;
            }
        };

        let bridge_liquidity = calculator::check_liquidity(
            bridge_quote.quote_volume_24h.as_ref(),
            &self.thresholds.min_bridge_quote_volume,
        );
        let local_liquidity = calculator::check_liquidity(
            local_quote.quote_volume_24h.as_ref(),
            &self.thresholds.min_local_quote_volume,
        );

        if bridge_liquidity == Liquidity::Unknown || local_liquidity == Liquidity::Unknown {
            stats.liquidity_unknown += 1;
            debug!("Skipping {}: 24h volume not published", pair.base_asset);
            return None;
        }
        if bridge_liquidity == Liquidity::BelowMinimum || local_liquidity == Liquidity::BelowMinimum {
            stats.liquidity_below_minimum += 1;
            debug!("Skipping {}: 24h volume below minimum", pair.base_asset);
            return None;
        }

        if profit_percent <= self.thresholds.min_profit_percent {
            stats.below_profit_threshold += 1;
            debug!(
                "Skipping {}: spread {}% does not exceed {}%",
                pair.base_asset,
                calculator::round_profit_percent(&profit_percent),
                self.thresholds.min_profit_percent
            );
            return None;
        }

        let opportunity = Opportunity {
            base_asset: pair.base_asset.clone(),
            pair: format!("{}/{}", self.local_currency.to_lowercase(), pair.base_asset),
            entry_price,
            exit_price: calculator::round_exit_price(&exit_price),
            profit_percent: calculator::round_profit_percent(&profit_percent),
            price_source,
            strategy_name: STRATEGY_NAME.to_string(),
            exchange_name: self.exchange_name.clone(),
        };

        info!(
            "Arbitrage opportunity: buy {} at {} ({}), exit at {}, expected profit {}%",
            opportunity.base_asset,
            opportunity.entry_price,
            opportunity.price_source,
            opportunity.exit_price,
            opportunity.profit_percent
        );

        Some((profit_percent, opportunity))
    }
}
