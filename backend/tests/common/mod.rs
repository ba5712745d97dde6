#![allow(dead_code)]

use async_trait::async_trait;
use cexwatch_backend::cache::{CacheError, CacheStore, MemoryCacheStore};
use cexwatch_backend::catalog::{CatalogError, TokenCatalogSource};
use cexwatch_backend::config::AppConfig;
use cexwatch_backend::services::CexServices;
use cexwatch_backend::types::Token;
use cexwatch_backend::venues::{VenueCredentials, VenueError, VenueIntegration};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Catalog source whose token list can be swapped between cycles.
pub struct MockCatalog {
    tokens: Mutex<Result<Vec<Token>, String>>,
}

impl MockCatalog {
    pub fn new(tokens: Vec<Token>) -> Arc<Self> {
        Arc::new(Self {
            tokens: Mutex::new(Ok(tokens)),
        })
    }

    pub fn set_tokens(&self, tokens: Vec<Token>) {
        *self.tokens.lock().unwrap() = Ok(tokens);
    }

    pub fn fail(&self, message: &str) {
        *self.tokens.lock().unwrap() = Err(message.to_string());
    }
}

#[async_trait]
impl TokenCatalogSource for MockCatalog {
    async fn get_tokens(&self) -> Result<Vec<Token>, CatalogError> {
        self.tokens
            .lock()
            .unwrap()
            .clone()
            .map_err(CatalogError::ApiError)
    }
}

/// Venue returning a swappable payload, or an error.
pub struct MockVenue {
    name: String,
    payload: Mutex<Result<Value, String>>,
}

impl MockVenue {
    pub fn ok(name: &str, payload: Value) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            payload: Mutex::new(Ok(payload)),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            payload: Mutex::new(Err("exchange not available".to_string())),
        })
    }

    pub fn set_payload(&self, payload: Value) {
        *self.payload.lock().unwrap() = Ok(payload);
    }
}

#[async_trait]
impl VenueIntegration for MockVenue {
    async fn fetch_currencies(&self, _: Option<&VenueCredentials>) -> Result<Value, VenueError> {
        self.payload
            .lock()
            .unwrap()
            .clone()
            .map_err(VenueError::ApiError)
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

/// Memory store that also records the order of writes.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryCacheStore,
    pub writes: Mutex<Vec<String>>,
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.set(key, value, ttl).await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        merchant_host: "merchant.test".to_string(),
        store_api_key: "test-key".to_string(),
        ..AppConfig::default()
    }
}

pub fn services(
    store: Arc<dyn CacheStore>,
    catalog: Arc<MockCatalog>,
    venues: Vec<Arc<MockVenue>>,
) -> CexServices {
    let venues = venues
        .into_iter()
        .map(|venue| venue as Arc<dyn VenueIntegration>)
        .collect();
    CexServices::assemble(test_config(), store, catalog, venues, HashMap::new())
}
