//! Key-value backend abstraction.
//!
//! A backend stores string values under string keys and understands Redis-style
//! glob patterns. [`crate::Cache`] is written against this trait so the Redis
//! connection and the in-process store are interchangeable.

use async_trait::async_trait;
use std::time::Duration;

use crate::store::CacheError;

/// Raw operations a cache backend must support.
///
/// Every method is a suspension point. Implementations report connectivity
/// failures as errors; deciding whether a failure is fatal is the caller's job.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the stored value, or `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value`. With a TTL the entry expires on its own, otherwise it
    /// persists until deleted.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Deletes the given keys and returns how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Lists every key matching `pattern` in one blocking call.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// One round of cursor iteration.
    ///
    /// Cursor `0` starts an iteration; a returned cursor of `0` ends it.
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), CacheError>;

    /// Round-trips to the backend to check that it is reachable.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Releases backend resources on graceful shutdown.
    async fn shutdown(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
