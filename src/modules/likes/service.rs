use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use scribe_auth::UserRole;
use scribe_cache::{Cache, invalidate};
use scribe_core::AppError;

use crate::modules::blogs::model::BlogRef;
use crate::modules::likes::model::LikeResponse;

pub struct LikeService;

impl LikeService {
    #[instrument(skip(db, cache), fields(blog.id = %blog_id, user.id = %user_id, db.operation = "INSERT", db.table = "likes"))]
    pub async fn like(
        db: &PgPool,
        cache: Option<&Cache>,
        blog_id: Uuid,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<LikeResponse, AppError> {
        let mut tx = db.begin().await?;

        let target = sqlx::query_as::<_, BlogRef>(
            "SELECT id, slug, status, author_id FROM blogs WHERE id = $1 FOR UPDATE",
        )
        .bind(blog_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Blog not found")))?;

        if !target.is_visible_to(user_id, role) {
            return Err(AppError::forbidden(anyhow!(
                "Access denied, insufficient permissions"
            )));
        }

        sqlx::query("INSERT INTO likes (blog_id, user_id) VALUES ($1, $2)")
            .bind(blog_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_unique_violation()
                {
                    return AppError::conflict(anyhow!("Blog already liked"));
                }
                AppError::from(e)
            })?;

        let likes_count = sqlx::query_scalar::<_, i32>(
            "UPDATE blogs SET likes_count = likes_count + 1 WHERE id = $1 RETURNING likes_count",
        )
        .bind(blog_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        invalidate_liked_blog(cache, &target).await;

        info!(likes_count, "Blog liked");

        Ok(LikeResponse {
            blog_id,
            likes_count,
        })
    }

    #[instrument(skip(db, cache), fields(blog.id = %blog_id, user.id = %user_id, db.operation = "DELETE", db.table = "likes"))]
    pub async fn unlike(
        db: &PgPool,
        cache: Option<&Cache>,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE blog_id = $1 AND user_id = $2")
            .bind(blog_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(AppError::not_found(anyhow!("Like not found")));
        }

        let target = sqlx::query_as::<_, BlogRef>(
            r#"UPDATE blogs SET likes_count = GREATEST(likes_count - 1, 0)
               WHERE id = $1
               RETURNING id, slug, status, author_id"#,
        )
        .bind(blog_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        invalidate_liked_blog(cache, &target).await;

        info!("Blog unliked");

        Ok(())
    }
}

/// `likes_count` is part of every cached copy of the post.
async fn invalidate_liked_blog(cache: Option<&Cache>, target: &BlogRef) {
    invalidate::clear_blog_by_slug(cache, &target.slug).await;
    invalidate::clear_blog_list_cache(cache).await;
    invalidate::clear_blog_cache_for_user(cache, target.author_id).await;
}
