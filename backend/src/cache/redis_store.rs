use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

use super::{CacheError, CacheStore};

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    pub redis_url: String,
    pub command_timeout_ms: u64,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            command_timeout_ms: 1000,
        }
    }
}

/// Shared Redis-backed [`CacheStore`]. Expiry is delegated to Redis (`SET EX`).
pub struct RedisCacheStore {
    connection: MultiplexedConnection,
    config: RedisCacheConfig,
}

impl RedisCacheStore {
    pub async fn with_config(config: RedisCacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!("Connected to Redis at {}", config.redis_url);

        Ok(Self { connection, config })
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.config.command_timeout_ms)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        let value = timeout(self.command_timeout(), connection.get::<_, Option<String>>(key))
            .await
            .map_err(|_| CacheError::Timeout(self.command_timeout()))??;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        // Redis rejects EX 0
        let seconds = ttl.as_secs().max(1) as usize;
        let mut connection = self.connection.clone();
        timeout(
            self.command_timeout(),
            connection.set_ex::<_, _, ()>(key, value, seconds),
        )
        .await
        .map_err(|_| CacheError::Timeout(self.command_timeout()))??;
        Ok(())
    }
}
