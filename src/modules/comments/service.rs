use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use scribe_auth::UserRole;
use scribe_cache::{Cache, invalidate, keys};
use scribe_core::{AppError, PaginationParams};

use crate::modules::blogs::model::BlogRef;
use crate::modules::comments::model::{
    BlogCommentsResponse, Comment, CommentListResponse, CommentRow, CreateCommentDto,
};

const SELECT_COMMENT: &str = r#"SELECT
        c.id, c.content,
        c.blog_id, b.title AS blog_title, b.slug AS blog_slug,
        c.user_id, u.username AS user_username,
        u.first_name AS user_first_name, u.last_name AS user_last_name,
        c.created_at, c.updated_at
       FROM comments c
       JOIN blogs b ON b.id = c.blog_id
       JOIN users u ON u.id = c.user_id"#;

pub struct CommentService;

impl CommentService {
    #[instrument(skip(db, cache), fields(db.operation = "SELECT", db.table = "comments"))]
    pub async fn list(
        db: &PgPool,
        cache: Option<&Cache>,
        params: PaginationParams,
    ) -> Result<CommentListResponse, AppError> {
        let limit = params.limit();
        let offset = params.offset();
        let cache_key = keys::comments::list(offset, limit);

        if let Some(cache) = cache
            && let Some(mut page) = cache.get_json::<CommentListResponse>(&cache_key).await
        {
            debug!(cache.key = %cache_key, "Comments found in cache");
            page.cached = true;
            return Ok(page);
        }

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(db)
            .await?;

        let comments: Vec<Comment> = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENT} ORDER BY c.created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(Comment::from)
        .collect();

        let page = CommentListResponse {
            offset,
            limit,
            total,
            comments,
            cached: false,
        };

        if let Some(cache) = cache
            && let Err(e) = cache
                .set_json(&cache_key, &page, Some(keys::COMMENT_TTL))
                .await
        {
            warn!(error = %e, "Failed to cache comments");
        }

        Ok(page)
    }

    #[instrument(skip(db, cache), fields(blog.id = %blog_id, db.operation = "SELECT", db.table = "comments"))]
    pub async fn list_by_blog(
        db: &PgPool,
        cache: Option<&Cache>,
        blog_id: Uuid,
    ) -> Result<BlogCommentsResponse, AppError> {
        let cache_key = keys::comments::by_blog(blog_id);

        if let Some(cache) = cache
            && let Some(comments) = cache.get_json::<Vec<Comment>>(&cache_key).await
        {
            debug!(cache.key = %cache_key, "Blog comments found in cache");
            return Ok(BlogCommentsResponse {
                comments,
                cached: true,
            });
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM blogs WHERE id = $1)")
            .bind(blog_id)
            .fetch_one(db)
            .await?;

        if !exists {
            return Err(AppError::not_found(anyhow!("Blog not found")));
        }

        let comments: Vec<Comment> = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENT} WHERE c.blog_id = $1 ORDER BY c.created_at DESC"
        ))
        .bind(blog_id)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(Comment::from)
        .collect();

        if let Some(cache) = cache
            && let Err(e) = cache
                .set_json(&cache_key, &comments, Some(keys::COMMENT_TTL))
                .await
        {
            warn!(error = %e, "Failed to cache blog comments");
        }

        Ok(BlogCommentsResponse {
            comments,
            cached: false,
        })
    }

    #[instrument(skip(db, cache, dto), fields(blog.id = %blog_id, user.id = %user_id, db.operation = "INSERT", db.table = "comments"))]
    pub async fn create(
        db: &PgPool,
        cache: Option<&Cache>,
        blog_id: Uuid,
        user_id: Uuid,
        role: UserRole,
        dto: CreateCommentDto,
    ) -> Result<Comment, AppError> {
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

        let comment_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO comments (blog_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(blog_id)
        .bind(user_id)
        .bind(&dto.content)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return AppError::bad_request(anyhow!("User does not exist"));
            }
            AppError::from(e)
        })?;

        sqlx::query("UPDATE blogs SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(blog_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let comment = Self::find_by_id(db, comment_id).await?;

        invalidate_after_comment_write(cache, &target).await;

        info!(comment.id = %comment.id, "Comment created");

        Ok(comment)
    }

    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "DELETE", db.table = "comments"))]
    pub async fn delete(
        db: &PgPool,
        cache: Option<&Cache>,
        comment_id: Uuid,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let (owner_id, blog_id) = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT user_id, blog_id FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Comment not found")))?;

        if owner_id != user_id && !role.is_admin() {
            warn!(comment.id = %comment_id, "Comment delete denied");
            return Err(AppError::forbidden(anyhow!(
                "Access denied, insufficient permissions"
            )));
        }

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        let target = sqlx::query_as::<_, BlogRef>(
            r#"UPDATE blogs SET comments_count = GREATEST(comments_count - 1, 0)
               WHERE id = $1
               RETURNING id, slug, status, author_id"#,
        )
        .bind(blog_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        invalidate_after_comment_write(cache, &target).await;

        info!(comment.id = %comment_id, "Comment deleted");

        Ok(())
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Comment, AppError> {
        sqlx::query_as::<_, CommentRow>(&format!("{SELECT_COMMENT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(Comment::from)
            .ok_or_else(|| AppError::not_found(anyhow!("Comment not found")))
    }
}

/// A comment changes the feed, the post's comment list and the post's
/// `comments_count`, which is embedded in every cached copy of the post.
async fn invalidate_after_comment_write(cache: Option<&Cache>, target: &BlogRef) {
    invalidate::clear_comments_by_blog_id(cache, target.id).await;
    invalidate::clear_comments_cache(cache).await;
    invalidate::clear_blog_by_slug(cache, &target.slug).await;
    invalidate::clear_blog_list_cache(cache).await;
    invalidate::clear_blog_cache_for_user(cache, target.author_id).await;
}
