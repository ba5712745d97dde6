use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::aggregator::{AggregatorError, CexAggregator, CycleReport};

/// Runs the startup collection and owns the periodic cycle and catalog
/// refresh jobs.
pub struct RefreshScheduler {
    aggregator: Arc<CexAggregator>,
    cycle_interval: Duration,
    catalog_interval: Duration,
    is_running: Arc<RwLock<bool>>,
    last_cycle: Arc<RwLock<Option<DateTime<Utc>>>>,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(aggregator: Arc<CexAggregator>, cycle_interval: Duration, catalog_interval: Duration) -> Self {
        Self {
            aggregator,
            cycle_interval,
            catalog_interval,
            is_running: Arc::new(RwLock::new(false)),
            last_cycle: Arc::new(RwLock::new(None)),
            shutdown: watch::channel(false).0,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Warms the catalog and runs the first cycle before the jobs start.
    pub async fn run_startup(&self) -> Result<CycleReport, AggregatorError> {
        info!("Running startup collection");
        let tokens = self.aggregator.catalog().load().await?;
        info!("Startup catalog holds {} tokens", tokens.len());
        self.trigger_immediate_cycle().await
    }

    /// Start the periodic jobs
    pub async fn start(&self) {
        let mut is_running = self.is_running.write().await;
        if *is_running {
            warn!("Refresh scheduler is already running");
            return;
        }
        *is_running = true;
        drop(is_running);
        self.shutdown.send_replace(false);

        info!(
            "Starting refresh scheduler: cycle every {}s, catalog every {}s",
            self.cycle_interval.as_secs(),
            self.catalog_interval.as_secs()
        );

        let cycle_job = {
            let aggregator = Arc::clone(&self.aggregator);
            let is_running = Arc::clone(&self.is_running);
            let last_cycle = Arc::clone(&self.last_cycle);
            let mut shutdown = self.shutdown.subscribe();
            let period = self.cycle_interval;

            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = shutdown.changed() => break,
                    }
                    if !*is_running.read().await {
                        break;
                    }

                    match aggregator.run_cycle().await {
                        Ok(_) => *last_cycle.write().await = Some(Utc::now()),
                        Err(e) => error!("Scheduled cycle failed: {}", e),
                    }
                }
                info!("Cycle job stopped");
            })
        };

        let catalog_job = {
            let aggregator = Arc::clone(&self.aggregator);
            let is_running = Arc::clone(&self.is_running);
            let mut shutdown = self.shutdown.subscribe();
            let period = self.catalog_interval;

            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = shutdown.changed() => break,
                    }
                    if !*is_running.read().await {
                        break;
                    }

                    // Refills the catalog once its TTL has lapsed
                    if let Err(e) = aggregator.catalog().load().await {
                        error!("Scheduled catalog refresh failed: {}", e);
                    }
                }
                info!("Catalog job stopped");
            })
        };

        self.handles.lock().await.extend([cycle_job, catalog_job]);
    }

    /// Stop the periodic jobs. Waits for a cycle already in flight to finish.
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.shutdown.send_replace(true);

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Scheduler job ended abnormally: {}", e);
            }
        }
        info!("Refresh scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Completion time of the last successful cycle
    pub async fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        *self.last_cycle.read().await
    }

    pub async fn trigger_immediate_cycle(&self) -> Result<CycleReport, AggregatorError> {
        info!("Triggering immediate collection cycle");
        let report = self.aggregator.run_cycle().await?;
        *self.last_cycle.write().await = Some(report.completed_at);
        Ok(report)
    }
}
