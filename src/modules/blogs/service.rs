use anyhow::anyhow;
use rand::{Rng, distributions::Alphanumeric};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use scribe_auth::UserRole;
use scribe_cache::{Cache, invalidate, keys};
use scribe_core::{AppError, PaginationParams};

use crate::modules::blogs::model::{
    Blog, BlogListResponse, BlogResponse, BlogRow, CachedBlogPage, CreateBlogDto, UpdateBlogDto,
};

const SELECT_BLOG: &str = r#"SELECT
        b.id, b.title, b.slug, b.content, b.banner_url, b.status, b.author_id,
        u.username AS author_username,
        u.first_name AS author_first_name,
        u.last_name AS author_last_name,
        b.views_count, b.likes_count, b.comments_count,
        b.published_at, b.created_at, b.updated_at
       FROM blogs b
       JOIN users u ON u.id = b.author_id"#;

const SLUG_SUFFIX_LEN: usize = 6;

/// Builds a URL slug from a title. Falls back to `post` for titles with no
/// usable characters.
pub fn slug_base(title: &str) -> String {
    let base = slug::slugify(title);
    if base.is_empty() {
        "post".to_string()
    } else {
        base
    }
}

fn slug_with_suffix(base: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", base, suffix.to_lowercase())
}

pub struct BlogService;

impl BlogService {
    #[instrument(skip(db, cache), fields(db.operation = "SELECT", db.table = "blogs"))]
    pub async fn list(
        db: &PgPool,
        cache: Option<&Cache>,
        role: UserRole,
        params: PaginationParams,
    ) -> Result<BlogListResponse, AppError> {
        let limit = params.limit();
        let offset = params.offset();
        let cache_key = keys::blogs::list(Some(role.as_str()), limit, offset);

        if let Some(cache) = cache
            && let Some(page) = cache.get_json::<CachedBlogPage>(&cache_key).await
        {
            debug!(cache.key = %cache_key, "Blog list found in cache");
            return Ok(BlogListResponse {
                limit,
                offset,
                total: page.total,
                blogs: page.blogs,
                cached: true,
            });
        }

        let filter = if role.is_admin() {
            ""
        } else {
            " WHERE b.status = 'published'"
        };

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM blogs b{filter}"))
            .fetch_one(db)
            .await?;

        let blogs: Vec<Blog> = sqlx::query_as::<_, BlogRow>(&format!(
            "{SELECT_BLOG}{filter} ORDER BY b.published_at DESC NULLS LAST, b.created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(Blog::from)
        .collect();

        let page = CachedBlogPage { total, blogs };
        if let Some(cache) = cache
            && let Err(e) = cache.set_json(&cache_key, &page, Some(keys::BLOG_TTL)).await
        {
            warn!(error = %e, "Failed to cache blog list");
        }

        Ok(BlogListResponse {
            limit,
            offset,
            total: page.total,
            blogs: page.blogs,
            cached: false,
        })
    }

    #[instrument(skip(db, cache), fields(author.id = %author_id, db.operation = "SELECT", db.table = "blogs"))]
    pub async fn list_by_user(
        db: &PgPool,
        cache: Option<&Cache>,
        author_id: Uuid,
        role: UserRole,
        params: PaginationParams,
    ) -> Result<BlogListResponse, AppError> {
        let limit = params.limit();
        let offset = params.offset();
        let cache_key = keys::blogs::by_user(author_id, Some(role.as_str()), limit, offset);

        if let Some(cache) = cache
            && let Some(page) = cache.get_json::<CachedBlogPage>(&cache_key).await
        {
            debug!(cache.key = %cache_key, "User blog list found in cache");
            return Ok(BlogListResponse {
                limit,
                offset,
                total: page.total,
                blogs: page.blogs,
                cached: true,
            });
        }

        let filter = if role.is_admin() {
            " WHERE b.author_id = $1"
        } else {
            " WHERE b.author_id = $1 AND b.status = 'published'"
        };

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM blogs b{filter}"))
            .bind(author_id)
            .fetch_one(db)
            .await?;

        let blogs: Vec<Blog> = sqlx::query_as::<_, BlogRow>(&format!(
            "{SELECT_BLOG}{filter} ORDER BY b.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(Blog::from)
        .collect();

        let page = CachedBlogPage { total, blogs };
        if let Some(cache) = cache
            && let Err(e) = cache.set_json(&cache_key, &page, Some(keys::BLOG_TTL)).await
        {
            warn!(error = %e, "Failed to cache user blog list");
        }

        Ok(BlogListResponse {
            limit,
            offset,
            total: page.total,
            blogs: page.blogs,
            cached: false,
        })
    }

    /// Loads a post by slug, from cache when possible.
    ///
    /// Visibility is checked against the cached copy too, so a cached draft
    /// is never handed to someone who may not see it.
    #[instrument(skip(db, cache), fields(db.operation = "SELECT", db.table = "blogs"))]
    pub async fn get_by_slug(
        db: &PgPool,
        cache: Option<&Cache>,
        slug: &str,
        viewer_id: Option<Uuid>,
        role: UserRole,
    ) -> Result<BlogResponse, AppError> {
        let cache_key = keys::blogs::by_slug(slug);

        if let Some(cache) = cache
            && let Some(blog) = cache.get_json::<Blog>(&cache_key).await
        {
            debug!(blog.slug = %slug, "Blog found in cache");
            ensure_visible(&blog, viewer_id, role)?;
            return Ok(BlogResponse { blog, cached: true });
        }

        let blog = Self::find_by_slug(db, slug).await?;

        // Cached regardless of status; every reader is re-checked on hit.
        if let Some(cache) = cache
            && let Err(e) = cache.set_json(&cache_key, &blog, Some(keys::BLOG_TTL)).await
        {
            warn!(error = %e, "Failed to cache blog");
        }

        ensure_visible(&blog, viewer_id, role)?;

        Ok(BlogResponse {
            blog,
            cached: false,
        })
    }

    #[instrument(skip(db, cache, dto), fields(author.id = %author_id, db.operation = "INSERT", db.table = "blogs"))]
    pub async fn create(
        db: &PgPool,
        cache: Option<&Cache>,
        author_id: Uuid,
        dto: CreateBlogDto,
    ) -> Result<Blog, AppError> {
        let status = dto.status.unwrap_or_default();
        let content = ammonia::clean(&dto.content);

        let base = slug_base(&dto.title);
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM blogs WHERE slug = $1)",
        )
        .bind(&base)
        .fetch_one(db)
        .await?;
        let slug = if taken { slug_with_suffix(&base) } else { base };

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO blogs (title, slug, content, banner_url, status, author_id, published_at)
               VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $5 = 'published' THEN NOW() END)
               RETURNING id"#,
        )
        .bind(&dto.title)
        .bind(&slug)
        .bind(&content)
        .bind(&dto.banner_url)
        .bind(status.as_str())
        .bind(author_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow!("A blog with this slug already exists"));
            }
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return AppError::bad_request(anyhow!("Author does not exist"));
            }
            AppError::from(e)
        })?;

        let blog = Self::find_by_id(db, id).await?;

        invalidate::clear_blog_list_cache(cache).await;
        invalidate::clear_blog_cache_for_user(cache, author_id).await;

        info!(blog.id = %blog.id, blog.slug = %blog.slug, "Blog created");

        Ok(blog)
    }

    #[instrument(skip(db, cache, dto), fields(user.id = %user_id, db.operation = "UPDATE", db.table = "blogs"))]
    pub async fn update(
        db: &PgPool,
        cache: Option<&Cache>,
        slug: &str,
        user_id: Uuid,
        role: UserRole,
        dto: UpdateBlogDto,
    ) -> Result<Blog, AppError> {
        let existing = Self::find_by_slug(db, slug).await?;

        if !existing.is_editable_by(user_id, role) {
            warn!(blog.id = %existing.id, "Blog update denied");
            return Err(AppError::forbidden(anyhow!(
                "Access denied, insufficient permissions"
            )));
        }

        let content = dto.content.as_deref().map(ammonia::clean);
        let status = dto.status.map(|s| s.as_str());

        sqlx::query(
            r#"UPDATE blogs SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                banner_url = COALESCE($4, banner_url),
                status = COALESCE($5, status),
                published_at = CASE
                    WHEN COALESCE($5, status) = 'published' THEN COALESCE(published_at, NOW())
                    ELSE published_at
                END,
                updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(existing.id)
        .bind(&dto.title)
        .bind(&content)
        .bind(&dto.banner_url)
        .bind(status)
        .execute(db)
        .await?;

        let blog = Self::find_by_id(db, existing.id).await?;

        invalidate::clear_blog_by_slug(cache, &existing.slug).await;
        invalidate::clear_blog_list_cache(cache).await;
        invalidate::clear_blog_cache_for_user(cache, existing.author.id).await;

        info!(blog.id = %blog.id, "Blog updated");

        Ok(blog)
    }

    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "DELETE", db.table = "blogs"))]
    pub async fn delete(
        db: &PgPool,
        cache: Option<&Cache>,
        slug: &str,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<(), AppError> {
        let existing = Self::find_by_slug(db, slug).await?;

        if !existing.is_editable_by(user_id, role) {
            warn!(blog.id = %existing.id, "Blog delete denied");
            return Err(AppError::forbidden(anyhow!(
                "Access denied, insufficient permissions"
            )));
        }

        // Comments and likes go with the post (ON DELETE CASCADE).
        sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(existing.id)
            .execute(db)
            .await?;

        invalidate::clear_blog_by_slug(cache, &existing.slug).await;
        invalidate::clear_blog_list_cache(cache).await;
        invalidate::clear_blog_cache_for_user(cache, existing.author.id).await;
        invalidate::clear_comments_by_blog_id(cache, existing.id).await;
        invalidate::clear_comments_cache(cache).await;

        info!(blog.id = %existing.id, "Blog deleted");

        Ok(())
    }

    pub async fn find_by_slug(db: &PgPool, slug: &str) -> Result<Blog, AppError> {
        sqlx::query_as::<_, BlogRow>(&format!("{SELECT_BLOG} WHERE b.slug = $1"))
            .bind(slug)
            .fetch_optional(db)
            .await?
            .map(Blog::from)
            .ok_or_else(|| AppError::not_found(anyhow!("Blog not found")))
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Blog, AppError> {
        sqlx::query_as::<_, BlogRow>(&format!("{SELECT_BLOG} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(Blog::from)
            .ok_or_else(|| AppError::not_found(anyhow!("Blog not found")))
    }
}

fn ensure_visible(blog: &Blog, viewer_id: Option<Uuid>, role: UserRole) -> Result<(), AppError> {
    if blog.is_visible_to(viewer_id, role) {
        return Ok(());
    }

    warn!(blog.id = %blog.id, viewer.id = ?viewer_id, "Draft blog access denied");
    Err(AppError::forbidden(anyhow!(
        "Access denied, insufficient permissions"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::blogs::model::BlogStatus;

    #[test]
    fn test_slug_base() {
        assert_eq!(slug_base("Hello, World!"), "hello-world");
        assert_eq!(slug_base("  Rust   in  2025 "), "rust-in-2025");
        assert_eq!(slug_base("!!!"), "post");
    }

    #[test]
    fn test_slug_with_suffix() {
        let slug = slug_with_suffix("hello-world");
        let suffix = slug.strip_prefix("hello-world-").unwrap();
        assert_eq!(suffix.len(), SLUG_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_blog_status_is_bound_as_text() {
        assert_eq!(BlogStatus::Published.as_str(), "published");
        assert_eq!(BlogStatus::default().as_str(), "draft");
    }
}
