use bigdecimal::BigDecimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

use crate::{
    error::{ScanError, ScanResult},
    types::{MarketQuote, MarketSnapshot},
};

/// Longest numeric text accepted from the exchange.
const MAX_DECIMAL_TEXT_LEN: usize = 64;
/// Largest decimal exponent, either direction, accepted from the exchange.
const MAX_DECIMAL_SCALE: i64 = 32;

/// Lenient numeric conversion for exchange payloads.
///
/// Accepts JSON numbers and numeric strings (thousands separators stripped).
/// Anything else, including `null`, yields `None`, as do values with an
/// extreme exponent or an overlong digit string.
pub fn parse_decimal(value: &Value) -> Option<BigDecimal> {
    let raw = match value {
        Value::String(s) => s.replace(',', ""),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let raw = raw.trim();
    if raw.len() > MAX_DECIMAL_TEXT_LEN {
        return None;
    }

    let decimal = BigDecimal::from_str(raw).ok()?;
    let (_, scale) = decimal.as_bigint_and_exponent();
    if scale.abs() > MAX_DECIMAL_SCALE {
        return None;
    }

    Some(decimal)
}

/// Builds a snapshot from the market-list envelope.
///
/// Individual entries that are malformed are dropped; only a broken envelope
/// fails the whole call.
pub fn parse_markets(body: &Value) -> ScanResult<MarketSnapshot> {
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => {}
        Some(false) => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(ScanError::UpstreamUnavailable(format!(
                "exchange reported failure on market list: {}",
                message
            )));
        }
        None => {
            return Err(ScanError::MalformedResponse(
                "market list has no success flag".to_string(),
            ))
        }
    }

    let raw_markets = body
        .pointer("/result/markets")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ScanError::MalformedResponse("market list has no result.markets array".to_string())
        })?;

    let snapshot: MarketSnapshot = raw_markets.iter().filter_map(parse_market_entry).collect();

    debug!(
        "Parsed {} of {} market entries ({} dropped)",
        snapshot.len(),
        raw_markets.len(),
        raw_markets.len() - snapshot.len()
    );

    Ok(snapshot)
}

fn parse_market_entry(entry: &Value) -> Option<MarketQuote> {
    let symbol = entry
        .get("symbol")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let last_price = entry
        .get("price")
        .and_then(parse_decimal)
        .filter(|price| *price > BigDecimal::from(0))?;

    let quote_volume_24h = entry
        .get("quote_volume_24h")
        .and_then(parse_decimal)
        .filter(|volume| *volume >= BigDecimal::from(0));

    Some(MarketQuote {
        symbol: symbol.to_string(),
        last_price,
        quote_volume_24h,
    })
}
