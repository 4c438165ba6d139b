use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One market as published by the exchange's market list.
///
/// Only quotes with a strictly positive last price are ever captured, so
/// `last_price` is always usable. A missing 24h volume means liquidity is
/// unknown, which is different from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub last_price: BigDecimal,
    pub quote_volume_24h: Option<BigDecimal>,
}

/// All markets captured in one fetch, keyed by symbol.
///
/// Backed by an ordered map so that iteration, and therefore evaluation
/// order, is identical for identical input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    quotes: BTreeMap<String, MarketQuote>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same symbol replace earlier ones.
    pub fn insert(&mut self, quote: MarketQuote) {
        self.quotes.insert(quote.symbol.clone(), quote);
    }

    pub fn get(&self, symbol: &str) -> Option<&MarketQuote> {
        self.quotes.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.quotes.contains_key(symbol)
    }

    pub fn quotes(&self) -> impl Iterator<Item = &MarketQuote> {
        self.quotes.values()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<MarketQuote> for MarketSnapshot {
    fn from_iter<I: IntoIterator<Item = MarketQuote>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for quote in iter {
            snapshot.insert(quote);
        }
        snapshot
    }
}

/// Outcome of an order-book depth lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceResolution {
    /// Best ask from a live order book.
    Precise(BigDecimal),
    /// The market answered but has nothing to offer; fall back to last trade.
    Unavailable,
    /// The lookup itself failed; the pair must be skipped this cycle.
    TransientError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    OrderBook,
    LastTrade,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::OrderBook => write!(f, "order_book"),
            PriceSource::LastTrade => write!(f, "last_trade"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(rename = "asset_name")]
    pub base_asset: String,
    pub pair: String,
    pub entry_price: BigDecimal,
    pub exit_price: BigDecimal,
    #[serde(rename = "expected_profit_percentage")]
    pub profit_percent: BigDecimal,
    #[serde(rename = "price_type")]
    pub price_source: PriceSource,
    pub strategy_name: String,
    pub exchange_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "last_updated")]
    pub timestamp: DateTime<Utc>,
    pub bridge_rate: BigDecimal,
    #[serde(rename = "opportunities_found")]
    pub opportunity_count: usize,
    pub opportunities: Vec<Opportunity>,
}

impl AnalysisResult {
    pub fn new(bridge_rate: BigDecimal, opportunities: Vec<Opportunity>) -> Self {
        Self {
            timestamp: Utc::now(),
            bridge_rate,
            opportunity_count: opportunities.len(),
            opportunities,
        }
    }
}
