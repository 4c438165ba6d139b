use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::arbitrage::EvaluationStats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerMetrics {
    pub started_at: DateTime<Utc>,
    pub total_cycles_completed: u64,
    pub total_cycles_failed: u64,
    pub total_opportunities_found: u64,
    pub total_pairs_evaluated: u64,
    pub total_fallback_prices: u64,
    pub total_transient_pair_errors: u64,
    pub total_liquidity_unknown: u64,
    pub total_liquidity_below_minimum: u64,
    pub publish_failures: u64,
    pub last_opportunity_count: usize,
    /// Local-currency symbols whose depth lookup failed transiently last cycle.
    pub last_transient_symbols: Vec<String>,
    pub last_error: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl ScannerMetrics {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            total_cycles_completed: 0,
            total_cycles_failed: 0,
            total_opportunities_found: 0,
            total_pairs_evaluated: 0,
            total_fallback_prices: 0,
            total_transient_pair_errors: 0,
            total_liquidity_unknown: 0,
            total_liquidity_below_minimum: 0,
            publish_failures: 0,
            last_opportunity_count: 0,
            last_transient_symbols: Vec::new(),
            last_error: None,
            last_updated: now,
        }
    }

    pub fn record_evaluation(&mut self, stats: &EvaluationStats) {
        self.total_cycles_completed += 1;
        self.total_opportunities_found += stats.emitted as u64;
        self.total_pairs_evaluated += stats.pairs_considered as u64;
        self.total_fallback_prices += stats.fallback_prices as u64;
        self.total_transient_pair_errors += stats.transient_errors as u64;
        self.total_liquidity_unknown += stats.liquidity_unknown as u64;
        self.total_liquidity_below_minimum += stats.liquidity_below_minimum as u64;
        self.last_opportunity_count = stats.emitted;
        self.last_transient_symbols = stats.transient_symbols.clone();
        self.last_updated = Utc::now();
    }

    pub fn record_cycle_failure(&mut self, error_message: &str) {
        self.total_cycles_failed += 1;
        self.last_error = Some(error_message.to_string());
        self.last_updated = Utc::now();
    }

    pub fn record_publish_failure(&mut self, error_message: &str) {
        self.publish_failures += 1;
        self.last_error = Some(error_message.to_string());
        self.last_updated = Utc::now();
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_cycles_completed + self.total_cycles_failed;
        if total == 0 {
            return 0.0;
        }
        self.total_cycles_completed as f64 / total as f64
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Arbitrage Scanner Metrics Report ===\n");
        report.push_str(&format!(
            "Uptime: {} seconds\n",
            (Utc::now() - self.started_at).num_seconds()
        ));
        report.push_str(&format!(
            "Cycles: {} completed, {} failed ({:.2}% success)\n",
            self.total_cycles_completed,
            self.total_cycles_failed,
            self.success_rate() * 100.0
        ));
        report.push_str(&format!(
            "Opportunities Found: {} (last cycle: {})\n",
            self.total_opportunities_found, self.last_opportunity_count
        ));
        report.push_str(&format!("Pairs Evaluated: {}\n", self.total_pairs_evaluated));
        report.push_str(&format!("Fallback Prices Used: {}\n", self.total_fallback_prices));
        report.push_str(&format!(
            "Transient Depth Errors: {}\n",
            self.total_transient_pair_errors
        ));
        if !self.last_transient_symbols.is_empty() {
            report.push_str(&format!(
                "Transient Symbols (last cycle): {}\n",
                self.last_transient_symbols.join(", ")
            ));
        }
        report.push_str(&format!(
            "Liquidity Skips: {} volume unknown, {} below minimum\n",
            self.total_liquidity_unknown, self.total_liquidity_below_minimum
        ));
        report.push_str(&format!("Publish Failures: {}\n", self.publish_failures));

        if let Some(ref error) = self.last_error {
            report.push_str(&format!("Last Error: {}\n", error));
        }

        report.push_str(&format!("Last Updated: {}\n", self.last_updated));

        report
    }

}

impl Default for ScannerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_evaluation_accumulates() {
        let mut metrics = ScannerMetrics::new();
        let stats = EvaluationStats {
            pairs_considered: 10,
            fallback_prices: 2,
            transient_errors: 1,
            liquidity_unknown: 3,
            liquidity_below_minimum: 4,
            emitted: 2,
            ..EvaluationStats::default()
        };

        metrics.record_evaluation(&stats);
        metrics.record_evaluation(&stats);

        assert_eq!(metrics.total_cycles_completed, 2);
        assert_eq!(metrics.total_opportunities_found, 4);
        assert_eq!(metrics.total_pairs_evaluated, 20);
        assert_eq!(metrics.total_liquidity_unknown, 6);
        assert_eq!(metrics.total_liquidity_below_minimum, 8);
        assert_eq!(metrics.last_opportunity_count, 2);
    }

    #[test]
    fn test_success_rate_and_report() {
        let mut metrics = ScannerMetrics::new();
        assert_eq!(metrics.success_rate(), 0.0);

        metrics.record_evaluation(&EvaluationStats::default());
        metrics.record_cycle_failure("Upstream unavailable: timeout");

        assert_eq!(metrics.success_rate(), 0.5);

        let report = metrics.generate_report();
        assert!(report.contains("1 completed, 1 failed"));
        assert!(report.contains("Last Error: Upstream unavailable: timeout"));
    }

    #[test]
    fn test_transient_symbols_reflect_last_cycle() {
        let mut metrics = ScannerMetrics::new();
        metrics.record_evaluation(&EvaluationStats {
            transient_errors: 2,
            transient_symbols: vec!["XRPTMN".to_string(), "DOGETMN".to_string()],
            ..EvaluationStats::default()
        });

        let report = metrics.generate_report();
        assert!(report.contains("Transient Symbols (last cycle): XRPTMN, DOGETMN"));

        metrics.record_evaluation(&EvaluationStats::default());
        assert!(metrics.last_transient_symbols.is_empty());
        assert_eq!(metrics.total_transient_pair_errors, 2);
        assert!(!metrics.generate_report().contains("Transient Symbols"));
    }

    #[test]
    fn test_publish_failure_is_reported() {
        let mut metrics = ScannerMetrics::new();
        metrics.record_publish_failure("disk full");

        assert_eq!(metrics.publish_failures, 1);
        assert!(metrics.generate_report().contains("Last Error: disk full"));
    }
}
