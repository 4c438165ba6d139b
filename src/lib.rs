pub mod api;
pub mod arbitrage;
pub mod bot;
pub mod config;
pub mod error;
pub mod exchange;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{ScanError, ScanResult};
pub use types::*;
