pub mod builder;
pub mod resolver;

pub use builder::build_token_record;
pub use resolver::resolve_network;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cache::{CacheError, CacheManager};
use crate::catalog::{CatalogError, TokenCatalog};
use crate::types::Snapshot;
use crate::venues::{NetworkAliasTable, VenueCurrencyFetcher};

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Token catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Summary of one aggregation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub tokens_processed: usize,
    pub venues_with_data: usize,
    pub venues_total: usize,
    pub elapsed_ms: u128,
    pub completed_at: DateTime<Utc>,
}

/// Drives a full collection cycle: catalog, venue fan-out, per-token records
/// and the merged snapshot.
pub struct CexAggregator {
    catalog: Arc<TokenCatalog>,
    fetcher: VenueCurrencyFetcher,
    aliases: NetworkAliasTable,
    cache: CacheManager,
    record_ttl: Duration,
}

impl CexAggregator {
    pub fn new(
        catalog: Arc<TokenCatalog>,
        fetcher: VenueCurrencyFetcher,
        aliases: NetworkAliasTable,
        cache: CacheManager,
        record_ttl: Duration,
    ) -> Self {
        info!(
            "CEX aggregator initialized with {} venues and {} networks",
            fetcher.venue_names().len(),
            aliases.len()
        );

        Self {
            catalog,
            fetcher,
            aliases,
            cache,
            record_ttl,
        }
    }

    pub fn venue_names(&self) -> Vec<String> {
        self.fetcher.venue_names()
    }

    pub fn catalog(&self) -> &Arc<TokenCatalog> {
        &self.catalog
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Runs one cycle and persists its results.
    ///
    /// Each token's record is written as soon as it is built, so readers see
    /// per-token data before the snapshot lands. Records are replaced, never
    /// merged with what an earlier cycle wrote.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport, AggregatorError> {
        let start = Instant::now();

        let tokens = self.catalog.load().await?;
        info!("Collecting venue data for {} tokens", tokens.len());

        let venues = self.venue_names();
        let tables = self.fetcher.fetch_all().await;
        let venues_with_data = tables.values().filter(|table| !table.is_empty()).count();

        let mut snapshot = Snapshot::new();
        for token in &tokens {
            let (network, statuses) = build_token_record(token, &venues, &tables, &self.aliases);

            let record = snapshot.entry(token.code.to_uppercase()).or_default();
            record.insert(network, statuses);

            self.cache
                .cache_token_record(&token.code, record, self.record_ttl)
                .await?;
            debug!("Stored record for {}", token.code);
        }

        self.cache.cache_snapshot(&snapshot, self.record_ttl).await?;

        let report = CycleReport {
            tokens_processed: tokens.len(),
            venues_with_data,
            venues_total: venues.len(),
            elapsed_ms: start.elapsed().as_millis(),
            completed_at: Utc::now(),
        };
        info!(
            "Cycle complete: {} tokens, {}/{} venues returned data, {}ms",
            report.tokens_processed, report.venues_with_data, report.venues_total, report.elapsed_ms
        );

        Ok(report)
    }
}
