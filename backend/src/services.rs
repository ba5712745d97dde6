use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::aggregator::CexAggregator;
use crate::api::CexApiState;
use crate::cache::{CacheManager, CacheStore, RedisCacheConfig, RedisCacheStore};
use crate::catalog::{MerchantApiClient, TokenCatalog, TokenCatalogSource};
use crate::config::AppConfig;
use crate::scheduler::RefreshScheduler;
use crate::venues::{HttpVenue, VenueCredentials, VenueCurrencyFetcher, VenueIntegration};

/// Fully wired service graph shared by the binaries.
pub struct CexServices {
    pub config: AppConfig,
    pub cache: CacheManager,
    pub catalog: Arc<TokenCatalog>,
    pub aggregator: Arc<CexAggregator>,
    pub scheduler: Arc<RefreshScheduler>,
}

impl CexServices {
    /// Production wiring: Redis, the merchant API and one HTTP client per
    /// enabled venue.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = RedisCacheStore::with_config(RedisCacheConfig {
            redis_url: config.redis_url.clone(),
            command_timeout_ms: config.cache_command_timeout_ms,
        })
        .await
        .context("failed to connect to Redis")?;

        let source = MerchantApiClient::new(&config.merchant_host, &config.store_api_key)
            .context("failed to build merchant API client")?;

        let venues: Vec<Arc<dyn VenueIntegration>> = config
            .enabled_venues()
            .into_iter()
            .map(|venue| {
                let api_url = config.venue_api_url(venue);
                info!("Venue {} -> {}", venue.name, api_url);
                Arc::new(HttpVenue::new(venue.name.clone(), api_url, config.venue_fetch_timeout()))
                    as Arc<dyn VenueIntegration>
            })
            .collect();

        let credentials = config
            .load_credentials()
            .context("failed to load venue credentials")?;

        Ok(Self::assemble(config, Arc::new(store), Arc::new(source), venues, credentials))
    }

    /// Wires the graph from already-built edges.
    pub fn assemble(
        config: AppConfig,
        store: Arc<dyn CacheStore>,
        source: Arc<dyn TokenCatalogSource>,
        venues: Vec<Arc<dyn VenueIntegration>>,
        credentials: HashMap<String, VenueCredentials>,
    ) -> Self {
        let cache = CacheManager::new(store);
        let catalog = Arc::new(TokenCatalog::new(source, cache.clone(), config.dv_currencies_ttl()));
        let fetcher = VenueCurrencyFetcher::new(venues, credentials, config.venue_fetch_timeout());
        let aggregator = Arc::new(CexAggregator::new(
            Arc::clone(&catalog),
            fetcher,
            config.network_aliases.clone(),
            cache.clone(),
            config.cex_data_ttl(),
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::clone(&aggregator),
            config.cex_data_ttl(),
            config.catalog_refresh_interval(),
        ));

        Self {
            config,
            cache,
            catalog,
            aggregator,
            scheduler,
        }
    }

    pub fn api_state(&self) -> CexApiState {
        CexApiState::new(self.cache.clone(), Arc::clone(&self.catalog), Arc::clone(&self.scheduler))
    }
}
