pub mod memory;
pub mod redis_store;

pub use memory::MemoryCacheStore;
pub use redis_store::{RedisCacheConfig, RedisCacheStore};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{Snapshot, Token, TokenRecord};

pub const CATALOG_KEY: &str = "dv:currencies";
pub const SNAPSHOT_KEY: &str = "cex:full_data";

pub fn token_key(code: &str) -> String {
    format!("cex:token:{}", code.to_uppercase())
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Cache command timed out after {0:?}")]
    Timeout(Duration),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value store with per-key expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, unless it is missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// Stores `value`, valid until now + `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

/// JSON layer over a [`CacheStore`] with the service's key scheme.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let serialized = serde_json::to_string(value)?;
        self.store.set(key, serialized, ttl).await?;
        debug!("Cached value with key: {}", key);
        Ok(())
    }

    /// Reads and decodes `key`. Entries that no longer decode count as a miss.
    pub async fn get_json<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key).await? else {
            debug!("Cache miss for key: {}", key);
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn cache_catalog(&self, tokens: &[Token], ttl: Duration) -> Result<(), CacheError> {
        self.set_json(CATALOG_KEY, tokens, ttl).await
    }

    pub async fn get_catalog(&self) -> Result<Option<Vec<Token>>, CacheError> {
        self.get_json(CATALOG_KEY).await
    }

    pub async fn cache_token_record(
        &self,
        code: &str,
        record: &TokenRecord,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_json(&token_key(code), record, ttl).await
    }

    pub async fn get_token_record(&self, code: &str) -> Result<Option<TokenRecord>, CacheError> {
        self.get_json(&token_key(code)).await
    }

    pub async fn cache_snapshot(&self, snapshot: &Snapshot, ttl: Duration) -> Result<(), CacheError> {
        self.set_json(SNAPSHOT_KEY, snapshot, ttl).await
    }

    pub async fn get_snapshot(&self) -> Result<Option<Snapshot>, CacheError> {
        self.get_json(SNAPSHOT_KEY).await
    }
}
