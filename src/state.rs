use anyhow::Context;
use scribe_cache::{Cache, CacheConfig};
use scribe_config::{CorsConfig, JwtConfig, RateLimitConfig};
use scribe_db::{DatabaseConfig, PgPool, init_db_pool};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub cache_config: CacheConfig,
    /// `None` when caching is disabled or the store was unreachable at
    /// startup; every read then goes straight to PostgreSQL.
    pub cache: Option<Cache>,
}

impl AppState {
    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let db = init_db_pool(&db_config)
        .await
        .context("Failed to connect to database")?;

    let cache_config = CacheConfig::from_env();
    let cache = init_cache(&cache_config).await;

    Ok(AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        cache_config,
        cache,
    })
}

/// Connects the cache. A failed connection is logged and the service keeps
/// running without a cache.
pub async fn init_cache(config: &CacheConfig) -> Option<Cache> {
    if !config.enabled {
        info!("Caching disabled");
        return None;
    }

    match Cache::connect(config).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "Cache unavailable, continuing without it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_cache_disabled() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::memory()
        };
        assert!(init_cache(&config).await.is_none());
    }

    #[tokio::test]
    async fn test_init_cache_memory() {
        let cache = init_cache(&CacheConfig::memory()).await;
        assert_eq!(cache.map(|c| c.backend_name()), Some("memory"));
    }
}
