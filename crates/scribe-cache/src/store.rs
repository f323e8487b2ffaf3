//! Cache adapter.
//!
//! [`Cache`] is the single access point to the key-value store. Values are
//! JSON strings; reads that fail for any reason degrade to a miss.

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::KeyValueBackend;
use crate::config::{CacheBackendKind, CacheConfig};
use crate::memory::MemoryBackend;
use crate::redis::RedisBackend;

/// Number of keys requested per `SCAN` round.
pub const SCAN_BATCH_SIZE: usize = 100;

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pattern delete stopped after removing {deleted} keys: {source}")]
    PartialInvalidation {
        deleted: u64,
        #[source]
        source: Box<CacheError>,
    },
}

impl CacheError {
    /// Whether the store could not be reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Unavailable(_) => true,
            Self::PartialInvalidation { source, .. } => source.is_connectivity(),
            Self::Serialization(_) => false,
        }
    }
}

/// Shared handle to the cache backend.
///
/// Cloning is cheap; every clone talks to the same backend.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn KeyValueBackend>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Cache {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wraps an already shared backend, keeping the caller's handle usable.
    pub fn from_arc(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Cache over a fresh in-process store.
    pub fn memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Builds the configured backend and checks that it answers.
    ///
    /// # Errors
    ///
    /// Returns a connectivity error if the backend cannot be reached.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let cache = match config.backend {
            CacheBackendKind::Redis => Self::new(RedisBackend::connect(config).await?),
            CacheBackendKind::Memory => Self::memory(),
        };

        cache.ping().await?;
        info!(cache.backend = cache.backend_name(), "Cache connected");

        Ok(cache)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Raw string read. Connectivity errors are returned to the caller.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.backend.get(key).await
    }

    /// Raw string write with an optional TTL.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.backend.set(key, value.to_string(), ttl).await
    }

    /// Reads and parses a JSON value.
    ///
    /// Returns `None` on a miss, on a connectivity error and on a value that
    /// does not parse. Failures are logged and never reach the caller.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get_json<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.backend.get(key).await {
            Ok(Some(value)) => match serde_json::from_str(&value) {
                Ok(parsed) => {
                    debug!(cache.key = %key, "Cache hit");
                    counter!("cache_requests_total", "result" => "hit").increment(1);
                    Some(parsed)
                }
                Err(e) => {
                    error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                    counter!("cache_requests_total", "result" => "error").increment(1);
                    None
                }
            },
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                counter!("cache_requests_total", "result" => "miss").increment(1);
                None
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Cache GET error");
                counter!("cache_requests_total", "result" => "error").increment(1);
                None
            }
        }
    }

    /// Serializes `value` as JSON and stores it.
    #[instrument(skip(self, value), fields(cache.operation = "SET"))]
    pub async fn set_json<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        self.backend.set(key, json, ttl).await?;

        debug!(
            cache.key = %key,
            cache.ttl_secs = ttl.map(|t| t.as_secs()),
            "Cache set"
        );

        Ok(())
    }

    /// Deletes one key. Returns 1 if it existed, 0 otherwise.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn del(&self, key: &str) -> Result<u64, CacheError> {
        let deleted = self.backend.del(&[key.to_string()]).await?;
        debug!(cache.key = %key, cache.deleted = deleted, "Cache invalidated");
        Ok(deleted)
    }

    /// Deletes several keys in one round-trip.
    pub async fn del_many(&self, keys: &[String]) -> Result<u64, CacheError> {
        self.backend.del(keys).await
    }

    /// Lists every key matching `pattern`.
    ///
    /// Blocks the store for the duration of the call; prefer
    /// [`Cache::scan_delete`] for large keyspaces.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.backend.keys(pattern).await
    }

    /// Deletes every key matching `pattern` using cursor iteration.
    ///
    /// Each round fetches up to [`SCAN_BATCH_SIZE`] candidates and deletes the
    /// matches before asking for the next batch. Ends when the cursor returns
    /// to `0`, so an empty match set costs exactly one round.
    ///
    /// # Errors
    ///
    /// A failure in the first round is returned as is. A failure after some
    /// keys were deleted is wrapped in [`CacheError::PartialInvalidation`].
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn scan_delete(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;
        let mut rounds: usize = 0;

        loop {
            let round = async {
                let (next_cursor, keys) =
                    self.backend.scan(cursor, pattern, SCAN_BATCH_SIZE).await?;
                let count = if keys.is_empty() {
                    0
                } else {
                    self.backend.del(&keys).await?
                };
                Ok::<_, CacheError>((next_cursor, count))
            };

            match round.await {
                Ok((next_cursor, count)) => {
                    deleted += count;
                    rounds += 1;
                    cursor = next_cursor;
                }
                Err(e) if rounds == 0 && deleted == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        cache.pattern = %pattern,
                        cache.deleted = deleted,
                        error = %e,
                        "Pattern invalidation interrupted"
                    );
                    counter!("cache_invalidated_keys_total").increment(deleted);
                    return Err(CacheError::PartialInvalidation {
                        deleted,
                        source: Box::new(e),
                    });
                }
            }

            if cursor == 0 {
                break;
            }
        }

        counter!("cache_invalidated_keys_total").increment(deleted);
        debug!(
            cache.pattern = %pattern,
            cache.deleted = deleted,
            cache.rounds = rounds,
            "Pattern invalidation complete"
        );

        Ok(deleted)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.backend.ping().await
    }

    /// Releases the backend. Called once during graceful shutdown.
    pub async fn shutdown(&self) {
        match self.backend.shutdown().await {
            Ok(()) => info!(cache.backend = self.backend_name(), "Cache shut down"),
            Err(e) => warn!(error = %e, "Cache shutdown failed"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory backend whose scans start failing after a number of rounds.
    pub struct FlakyScanBackend {
        pub inner: MemoryBackend,
        pub fail_after_rounds: usize,
        rounds: AtomicUsize,
    }

    impl FlakyScanBackend {
        pub fn new(fail_after_rounds: usize) -> Self {
            Self {
                inner: MemoryBackend::new(),
                fail_after_rounds,
                rounds: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KeyValueBackend for FlakyScanBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.inner.get(key).await
        }

        async fn set(
            &self,
            key: &str,
            value: String,
            ttl: Option<Duration>,
        ) -> Result<(), CacheError> {
            self.inner.set(key, value, ttl).await
        }

        async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
            self.inner.del(keys).await
        }

        async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
            self.inner.keys(pattern).await
        }

        async fn scan(
            &self,
            cursor: u64,
            pattern: &str,
            count: usize,
        ) -> Result<(u64, Vec<String>), CacheError> {
            if self.rounds.fetch_add(1, Ordering::SeqCst) >= self.fail_after_rounds {
                return Err(CacheError::Unavailable("connection reset".into()));
            }
            self.inner.scan(cursor, pattern, count).await
        }

        async fn ping(&self) -> Result<(), CacheError> {
            self.inner.ping().await
        }
    }
}
