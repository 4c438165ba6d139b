use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::sleep};
use tracing::{debug, error, info};

use crate::{
    arbitrage::OpportunityEvaluator,
    bot::ScannerMetrics,
    config::Config,
    error::ScanResult,
    exchange::{DepthPriceResolver, ExchangeClient, MarketDataSource},
    storage::ResultPublisher,
};

/// Runs fetch → evaluate → publish cycles one at a time.
pub struct ScannerBot {
    config: Config,
    source: Arc<dyn MarketDataSource>,
    resolver: Arc<dyn DepthPriceResolver>,
    evaluator: OpportunityEvaluator,
    publisher: ResultPublisher,
    metrics: ScannerMetrics,
}

impl ScannerBot {
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing arbitrage scanner");

        let client = Arc::new(ExchangeClient::new(&config.exchange)?);
        Self::with_components(config, client.clone(), client)
    }

    pub fn with_components(
        config: Config,
        source: Arc<dyn MarketDataSource>,
        resolver: Arc<dyn DepthPriceResolver>,
    ) -> Result<Self> {
        let evaluator = OpportunityEvaluator::new(&config)?;
        let publisher = ResultPublisher::new(config.output.results_path.clone());

        info!(
            "Scanner ready: source={}, bridge={}, min profit={}%, output={}",
            source.name(),
            evaluator.bridge_rate_symbol(),
            evaluator.thresholds().min_profit_percent,
            publisher.path().display()
        );

        Ok(Self {
            config,
            source,
            resolver,
            evaluator,
            publisher,
            metrics: ScannerMetrics::new(),
        })
    }

    /// Runs until `shutdown` flips or its sender is dropped.
    ///
    /// A cycle in progress is always allowed to finish, so a shutdown never
    /// interrupts publishing.
    pub async fn start(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let interval = self.config.check_interval();
        let report_every = self.config.arbitrage.report_every_cycles;
        let mut cycle_count = 0u64;

        info!("Starting scan loop with {:?} between cycles", interval);

        loop {
            cycle_count += 1;
            debug!("Starting scan cycle #{}", cycle_count);

            match self.run_single_cycle().await {
                Ok(opportunities_found) => {
                    info!(
                        "Scan cycle #{} finished, {} opportunities",
                        cycle_count, opportunities_found
                    );
                }
                Err(e) => {
                    error!("Scan cycle #{} aborted: {}", cycle_count, e);
                    self.metrics.record_cycle_failure(&e.to_string());
                }
            }

            if report_every > 0 && cycle_count % report_every == 0 {
                info!("{}", self.metrics.generate_report());
            }

            if *shutdown.borrow() {
                break;
            }

            if !Self::wait_for_next_cycle(interval, &mut shutdown).await {
                break;
            }
        }

        info!("Scan loop stopped after {} cycles", cycle_count);
        Ok(())
    }

    /// Returns `false` when shutdown was requested during the wait.
    async fn wait_for_next_cycle(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
        debug!("Waiting {:?} before the next cycle", interval);

        tokio::select! {
            _ = sleep(interval) => true,
            _ = shutdown.changed() => false,
        }
    }

    /// One complete cycle. Nothing is written unless fetch and evaluation
    /// both succeed; a failed write is logged and does not fail the cycle.
    pub async fn run_single_cycle(&mut self) -> ScanResult<usize> {
        info!("Starting analysis cycle");

        let snapshot = self.source.fetch_snapshot().await?;
        let evaluation = self
            .evaluator
            .evaluate_detailed(&snapshot, self.resolver.as_ref())
            .await?;

        self.metrics.record_evaluation(&evaluation.stats);
        let opportunities_found = evaluation.result.opportunity_count;

        if let Err(e) = self.publisher.publish(&evaluation.result).await {
            error!("{}; previous results remain in place", e);
            self.metrics.record_publish_failure(&e.to_string());
        }

        Ok(opportunities_found)
    }

    pub fn metrics(&self) -> &ScannerMetrics {
        &self.metrics
    }
}
