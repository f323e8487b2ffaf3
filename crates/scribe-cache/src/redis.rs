//! Redis backend for distributed caching.
//!
//! Wraps a [`ConnectionManager`], which pipelines commands over one multiplexed
//! connection and reconnects with bounded exponential backoff when the link drops.
//! Commands issued while disconnected fail and are reported to the caller.

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::backend::KeyValueBackend;
use crate::config::CacheConfig;
use crate::store::CacheError;

/// Redis-backed [`KeyValueBackend`].
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connects to Redis using the URL and retry policy from `config`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or the first
    /// connection attempt fails.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;

        let manager_config = ConnectionManagerConfig::new()
            .set_factor(config.retry_factor_ms)
            .set_max_delay(config.retry_max_delay_ms)
            .set_number_of_retries(config.retry_attempts)
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.response_timeout);

        let conn = ConnectionManager::new_with_config(client, manager_config).await?;

        info!(
            cache.retry_factor_ms = config.retry_factor_ms,
            cache.retry_max_delay_ms = config.retry_max_delay_ms,
            "Connected to Redis"
        );

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value = conn.get::<_, Option<String>>(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(cache.operation = "SET"))]
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        match ttl {
            // EX rejects 0, so sub-second TTLs round up to one second
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                    .await?
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }

        Ok(())
    }

    #[instrument(skip(self, keys), fields(cache.operation = "DEL", cache.keys = keys.len()))]
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let count: u64 = conn.del(keys).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(cache.operation = "KEYS"))]
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    #[instrument(skip(self), fields(cache.operation = "SCAN"))]
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), CacheError> {
        let mut conn = self.conn.clone();

        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        Ok((next_cursor, keys))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), CacheError> {
        // The manager closes its socket once the last clone is dropped.
        debug!("Releasing Redis connection manager");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Cache;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: i32,
        name: String,
    }

    fn test_config() -> CacheConfig {
        CacheConfig {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_and_get() {
        let backend = RedisBackend::connect(&test_config()).await.unwrap();
        let cache = Cache::new(backend);

        let data = TestData {
            id: 1,
            name: "test".to_string(),
        };

        cache
            .set_json("test:key", &data, Some(Duration::from_secs(60)))
            .await
            .unwrap();

        let retrieved: Option<TestData> = cache.get_json("test:key").await;
        assert_eq!(retrieved, Some(data));

        assert_eq!(cache.del("test:key").await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_scan_delete_across_batches() {
        let backend = RedisBackend::connect(&test_config()).await.unwrap();
        let cache = Cache::new(backend);

        for i in 0..250 {
            cache
                .set(&format!("scan-test:{i}"), "v", Some(Duration::from_secs(60)))
                .await
                .unwrap();
        }

        let deleted = cache.scan_delete("scan-test:*").await.unwrap();
        assert_eq!(deleted, 250);
        assert!(cache.keys("scan-test:*").await.unwrap().is_empty());
    }
}
