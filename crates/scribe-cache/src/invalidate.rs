//! Cache invalidation helpers.
//!
//! Each helper maps a change to stored data onto the cache entries that may
//! now be stale. Call them after the write has been committed. They never
//! fail: errors are logged and the TTL bounds the stale window.
//!
//! List caches are keyed by role and page, so they are cleared by pattern.
//! Single-entity caches are cleared by exact key.

use tracing::{info, warn};
use uuid::Uuid;

use crate::keys;
use crate::store::Cache;

/// Clears the cached blog for `slug`.
pub async fn clear_blog_by_slug(cache: Option<&Cache>, slug: &str) {
    let Some(cache) = cache else { return };

    match cache.del(&keys::blogs::by_slug(slug)).await {
        Ok(_) => info!(blog.slug = %slug, "Cleared blog cache"),
        Err(e) => warn!(error = %e, blog.slug = %slug, "Failed to invalidate blog cache"),
    }
}

/// Clears every page of the global blog list, for every role.
pub async fn clear_blog_list_cache(cache: Option<&Cache>) {
    let Some(cache) = cache else { return };

    match cache.scan_delete(keys::blogs::list_pattern()).await {
        Ok(deleted) => info!(cache.deleted = deleted, "Cleared blog list cache entries"),
        Err(e) => warn!(error = %e, "Failed to invalidate blog list caches"),
    }
}

/// Clears every cached list page of one author's blogs.
pub async fn clear_blog_cache_for_user(cache: Option<&Cache>, user_id: Uuid) {
    let Some(cache) = cache else { return };

    match cache
        .scan_delete(&keys::blogs::by_user_pattern(user_id))
        .await
    {
        Ok(deleted) => info!(cache.deleted = deleted, user_id = %user_id, "Cleared user blog cache entries"),
        Err(e) => warn!(error = %e, user_id = %user_id, "Failed to invalidate user blog caches"),
    }
}

/// Clears the global blog lists and every author's lists.
pub async fn clear_all_blog_caches(cache: Option<&Cache>) {
    let Some(cache) = cache else { return };

    clear_blog_list_cache(Some(cache)).await;

    match cache.scan_delete(keys::blogs::all_users_pattern()).await {
        Ok(deleted) => info!(cache.deleted = deleted, "Cleared all blog caches"),
        Err(e) => warn!(error = %e, "Failed to invalidate per-user blog caches"),
    }
}

/// Clears the cached comments of one blog.
pub async fn clear_comments_by_blog_id(cache: Option<&Cache>, blog_id: Uuid) {
    let Some(cache) = cache else { return };

    if let Err(e) = cache.del(&keys::comments::by_blog(blog_id)).await {
        warn!(error = %e, blog_id = %blog_id, "Failed to invalidate blog comments cache");
    }
}

/// Clears global comment pages. A `None` bound matches every value.
pub async fn clear_comments_pagination(
    cache: Option<&Cache>,
    offset: Option<i64>,
    limit: Option<i64>,
) {
    let Some(cache) = cache else { return };

    let pattern = keys::comments::list_pattern(offset, limit);
    delete_listed(cache, &pattern, "comment pages").await;
}

/// Clears every page of the global comment list.
pub async fn clear_comments_cache(cache: Option<&Cache>) {
    clear_comments_pagination(cache, None, None).await;
}

/// Clears the profile cache of `user_id` and anything keyed under it.
pub async fn clear_user_cache(cache: Option<&Cache>, user_id: Uuid) {
    let Some(cache) = cache else { return };

    let pattern = keys::users::invalidation_pattern(user_id);
    delete_listed(cache, &pattern, "user").await;
}

/// Clears the cache entry keyed by a user's email.
pub async fn clear_user_cache_by_email(cache: Option<&Cache>, email: &str) {
    let Some(cache) = cache else { return };

    match cache.del(&keys::users::by_email(email)).await {
        Ok(0) => info!(user.email = %email, "No cache found for user email"),
        Ok(_) => info!(user.email = %email, "Cleared cache for user email"),
        Err(e) => warn!(error = %e, user.email = %email, "Failed to invalidate user email cache"),
    }
}

/// Lists the matching keys and deletes them in one call.
///
/// Used for keyspaces that stay small, where a single `KEYS` is cheaper than
/// a full cursor iteration.
async fn delete_listed(cache: &Cache, pattern: &str, what: &str) {
    let keys = match cache.keys(pattern).await {
        Ok(keys) => keys,
        Err(e) => {
            warn!(error = %e, cache.pattern = %pattern, "Failed to list {what} cache keys");
            return;
        }
    };

    if keys.is_empty() {
        return;
    }

    match cache.del_many(&keys).await {
        Ok(deleted) => {
            metrics::counter!("cache_invalidated_keys_total").increment(deleted);
            info!(cache.deleted = deleted, cache.pattern = %pattern, "Cleared {what} cache entries");
        }
        Err(e) => warn!(error = %e, cache.pattern = %pattern, "Failed to invalidate {what} cache"),
    }
}
