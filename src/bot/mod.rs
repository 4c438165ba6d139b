pub mod metrics;
pub mod orchestrator;

pub use metrics::ScannerMetrics;
pub use orchestrator::ScannerBot;
