use std::path::PathBuf;
use thiserror::Error;

/// Failures of a scan cycle.
///
/// `UpstreamUnavailable`, `MalformedResponse` and `MissingBridgeRate` abort the
/// whole cycle. `TransientPairError` only ever costs one pair, and
/// `WriteFailure` leaves the previous artifact in place.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Bridge rate market {symbol} is missing or has a non-positive price")]
    MissingBridgeRate { symbol: String },

    #[error("Depth lookup failed for {symbol}: {reason}")]
    TransientPairError { symbol: String, reason: String },

    #[error("Failed to write results to {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
