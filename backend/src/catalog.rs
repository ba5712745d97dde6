use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::cache::{CacheError, CacheManager};
use crate::types::Token;

const STORE_CURRENCIES_PATH: &str = "/api/v1/external/store/currencies";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Merchant API error: {0}")]
    ApiError(String),
    #[error("Invalid client configuration: {0}")]
    ConfigError(String),
    #[error("Catalog cache error: {0}")]
    CacheError(#[from] CacheError),
}

/// Source of the merchant's token catalog.
#[async_trait]
pub trait TokenCatalogSource: Send + Sync {
    async fn get_tokens(&self) -> Result<Vec<Token>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct StoreCurrenciesResponse {
    data: Vec<Token>,
}

/// Client for the merchant store API.
pub struct MerchantApiClient {
    client: Client,
    base_url: String,
}

impl MerchantApiClient {
    pub fn new(merchant_host: &str, store_api_key: &str) -> Result<Self, CatalogError> {
        Self::with_base_url(format!("https://{}", merchant_host), store_api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, store_api_key: &str) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(store_api_key)
            .map_err(|e| CatalogError::ConfigError(format!("store API key is not a valid header: {}", e)))?;
        headers.insert("x-api-key", api_key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn currencies_url(&self) -> String {
        format!("{}{}", self.base_url, STORE_CURRENCIES_PATH)
    }
}

#[async_trait]
impl TokenCatalogSource for MerchantApiClient {
    async fn get_tokens(&self) -> Result<Vec<Token>, CatalogError> {
        let response = self.client.get(self.currencies_url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::ApiError(format!("store currencies returned HTTP {}", status)));
        }

        let body: StoreCurrenciesResponse = response.json().await?;
        Ok(body.data)
    }
}

/// Cache-backed token catalog.
pub struct TokenCatalog {
    source: Arc<dyn TokenCatalogSource>,
    cache: CacheManager,
    ttl: Duration,
}

impl TokenCatalog {
    pub fn new(source: Arc<dyn TokenCatalogSource>, cache: CacheManager, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }

    /// Cached catalog, or a fresh one from the merchant API when the cached
    /// copy is missing, empty or expired.
    pub async fn load(&self) -> Result<Vec<Token>, CatalogError> {
        if let Some(tokens) = self.cached().await? {
            return Ok(tokens);
        }

        self.refresh().await
    }

    /// Fetches the catalog from the source and replaces the cached copy.
    pub async fn refresh(&self) -> Result<Vec<Token>, CatalogError> {
        info!("Updating DV currencies data");
        let tokens = self.source.get_tokens().await?;
        self.cache.cache_catalog(&tokens, self.ttl).await?;
        info!("Cached {} DV currencies for {:?}", tokens.len(), self.ttl);
        Ok(tokens)
    }

    pub async fn cached(&self) -> Result<Option<Vec<Token>>, CatalogError> {
        Ok(self.cache.get_catalog().await?.filter(|tokens| !tokens.is_empty()))
    }
}
