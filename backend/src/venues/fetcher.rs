use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::{VenueCredentials, VenueCurrencyTable, VenueIntegration};

/// Fetches currency tables from every configured venue.
///
/// A venue that fails, times out or returns garbage contributes an empty
/// table; it never fails or delays the other venues beyond the timeout.
pub struct VenueCurrencyFetcher {
    venues: Vec<Arc<dyn VenueIntegration>>,
    credentials: HashMap<String, VenueCredentials>,
    fetch_timeout: Duration,
}

impl VenueCurrencyFetcher {
    pub fn new(
        venues: Vec<Arc<dyn VenueIntegration>>,
        credentials: HashMap<String, VenueCredentials>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            venues,
            credentials,
            fetch_timeout,
        }
    }

    /// Configured venue identifiers, in configuration order.
    pub fn venue_names(&self) -> Vec<String> {
        self.venues.iter().map(|venue| venue.get_name().to_string()).collect()
    }

    #[instrument(skip_all, fields(venue = %venue.get_name()))]
    pub async fn fetch(&self, venue: &dyn VenueIntegration) -> VenueCurrencyTable {
        let name = venue.get_name();
        let credentials = self.credentials.get(name);

        let fetch = venue.fetch_currencies(credentials);
        let raw = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!("[{}] fetch_currencies failed: {}", name, e);
                return VenueCurrencyTable::empty();
            }
            Err(_) => {
                error!("[{}] fetch_currencies timed out after {:?}", name, self.fetch_timeout);
                return VenueCurrencyTable::empty();
            }
        };

        match VenueCurrencyTable::from_raw(name, raw) {
            Ok(table) if table.is_empty() => {
                warn!("[{}] fetch_currencies returned no currencies", name);
                table
            }
            Ok(table) => {
                info!("[{}] fetch_currencies returned {} currencies", name, table.len());
                table
            }
            Err(e) => {
                error!("[{}] fetch_currencies payload rejected: {}", name, e);
                VenueCurrencyTable::empty()
            }
        }
    }

    /// Fetches all venues concurrently and waits for every one of them.
    pub async fn fetch_all(&self) -> HashMap<String, VenueCurrencyTable> {
        let fetches = self.venues.iter().map(|venue| async move {
            let table = self.fetch(venue.as_ref()).await;
            (venue.get_name().to_string(), table)
        });

        join_all(fetches).await.into_iter().collect()
    }
}
