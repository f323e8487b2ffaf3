//! # Scribe Cache
//!
//! Read-through caching and cache invalidation for the Scribe API.
//!
//! This crate provides:
//! - A key-value backend abstraction with Redis and in-memory implementations
//! - The [`Cache`] adapter (get, set-with-TTL, JSON helpers, delete, pattern scan-delete)
//! - Canonical cache key builders and TTLs per resource type
//! - Best-effort invalidation helpers that never fail the calling request
//! - Cache configuration from environment variables
//!
//! # Example
//!
//! ```ignore
//! use scribe_cache::{Cache, CacheConfig, keys};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CacheConfig::from_env();
//!     let cache = Cache::connect(&config).await.unwrap();
//!
//!     let key = keys::blogs::by_slug("hello-world");
//!     cache.set_json(&key, &my_blog, Some(keys::BLOG_TTL)).await.unwrap();
//!
//!     let blog: Option<Blog> = cache.get_json(&key).await;
//!
//!     scribe_cache::invalidate::clear_blog_by_slug(Some(&cache), "hello-world").await;
//! }
//! ```

pub mod backend;
pub mod config;
pub mod invalidate;
pub mod keys;
pub mod memory;
pub mod redis;
pub mod store;

pub use backend::KeyValueBackend;
pub use config::{CacheBackendKind, CacheConfig};
pub use memory::MemoryBackend;
pub use crate::redis::RedisBackend;
pub use store::{Cache, CacheError, SCAN_BATCH_SIZE};
