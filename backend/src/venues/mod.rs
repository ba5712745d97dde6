// Venue-side currency metadata
pub mod alias;
pub mod fetcher;
pub mod http;
pub mod table;

pub use alias::NetworkAliasTable;
pub use fetcher::VenueCurrencyFetcher;
pub use http::HttpVenue;
pub use table::{CurrencyEntry, NetworkMetadata, VenueCurrencyTable};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Venues queried when no list is configured.
pub const DEFAULT_VENUES: &[&str] = &["htx", "okx", "binance", "bitget", "kucoin", "mexc"];

#[derive(Error, Debug)]
pub enum VenueError {
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// API credentials for one venue, as stored in the api keys file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueCredentials {
    pub api_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl fmt::Debug for VenueCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueCredentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Capability to fetch a venue's currency/network table.
///
/// Implementations return the venue payload untouched; normalization happens
/// in [`VenueCurrencyTable::from_raw`].
#[async_trait]
pub trait VenueIntegration: Send + Sync {
    async fn fetch_currencies(
        &self,
        credentials: Option<&VenueCredentials>,
    ) -> Result<serde_json::Value, VenueError>;
    fn get_name(&self) -> &str;
}
