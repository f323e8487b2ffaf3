use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use scribe_cache::{Cache, invalidate, keys};
use scribe_core::{AppError, PaginationMeta, PaginationParams};

use crate::modules::users::model::{
    UpdateCurrentUserDto, User, UserListResponse, UserResponse, UserRow,
};

const SELECT_USER: &str = r#"SELECT
        id, username, email, first_name, last_name, role, website, created_at, updated_at
       FROM users"#;

pub struct UserService;

impl UserService {
    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get_current(
        db: &PgPool,
        cache: Option<&Cache>,
        user_id: Uuid,
    ) -> Result<UserResponse, AppError> {
        let cache_key = keys::users::by_id(user_id);

        if let Some(cache) = cache
            && let Some(user) = cache.get_json::<User>(&cache_key).await
        {
            debug!("User found in cache");
            return Ok(UserResponse { user, cached: true });
        }

        let user = Self::find_by_id(db, user_id).await?;

        if let Some(cache) = cache
            && let Err(e) = cache.set_json(&cache_key, &user, Some(keys::USER_TTL)).await
        {
            warn!(error = %e, "Failed to cache user");
        }

        Ok(UserResponse {
            user,
            cached: false,
        })
    }

    #[instrument(skip(db, cache, dto), fields(user.id = %user_id, db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_current(
        db: &PgPool,
        cache: Option<&Cache>,
        user_id: Uuid,
        dto: UpdateCurrentUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::find_by_id(db, user_id).await?;

        let user: User = sqlx::query_as::<_, UserRow>(
            r#"UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                website = COALESCE($6, website),
                updated_at = NOW()
               WHERE id = $1
               RETURNING id, username, email, first_name, last_name, role, website, created_at, updated_at"#,
        )
        .bind(user_id)
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.website)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow!("Username or email already in use"));
            }
            AppError::from(e)
        })?
        .map(User::from)
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        invalidate::clear_user_cache(cache, user_id).await;
        invalidate::clear_user_cache_by_email(cache, &existing.email).await;
        if user.email != existing.email {
            invalidate::clear_user_cache_by_email(cache, &user.email).await;
        }
        // Author names are embedded in cached posts.
        invalidate::clear_blog_cache_for_user(cache, user_id).await;
        invalidate::clear_blog_list_cache(cache).await;

        info!("User profile updated");

        Ok(user)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn list(db: &PgPool, params: PaginationParams) -> Result<UserListResponse, AppError> {
        let limit = params.limit();
        let offset = params.offset();

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;

        let users = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

        Ok(UserListResponse {
            meta: PaginationMeta::new(total, limit, offset),
            users,
        })
    }

    /// Deletes a user together with their posts, comments and likes.
    ///
    /// Counters on other users' posts are corrected in the same transaction,
    /// then every cached view that could mention the user is dropped.
    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "DELETE", db.table = "users"))]
    pub async fn delete(db: &PgPool, cache: Option<&Cache>, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let commented: Vec<(Uuid, String)> = sqlx::query_as(
            r#"UPDATE blogs b
               SET comments_count = GREATEST(b.comments_count - c.n, 0)
               FROM (SELECT blog_id, COUNT(*)::INT AS n FROM comments WHERE user_id = $1 GROUP BY blog_id) c
               WHERE b.id = c.blog_id AND b.author_id <> $1
               RETURNING b.id, b.slug"#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let liked: Vec<(Uuid, String)> = sqlx::query_as(
            r#"UPDATE blogs b
               SET likes_count = GREATEST(b.likes_count - 1, 0)
               FROM likes l
               WHERE l.blog_id = b.id AND l.user_id = $1 AND b.author_id <> $1
               RETURNING b.id, b.slug"#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let own: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, slug FROM blogs WHERE author_id = $1")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?;

        // Posts, comments and likes cascade.
        let email = sqlx::query_scalar::<_, String>("DELETE FROM users WHERE id = $1 RETURNING email")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        tx.commit().await?;

        invalidate::clear_user_cache(cache, user_id).await;
        invalidate::clear_user_cache_by_email(cache, &email).await;
        invalidate::clear_blog_cache_for_user(cache, user_id).await;
        invalidate::clear_all_blog_caches(cache).await;
        invalidate::clear_comments_cache(cache).await;
        for (blog_id, slug) in commented.iter().chain(&liked).chain(&own) {
            invalidate::clear_blog_by_slug(cache, slug).await;
            invalidate::clear_comments_by_blog_id(cache, *blog_id).await;
        }

        info!(
            blogs.deleted = own.len(),
            blogs.touched = commented.len() + liked.len(),
            "User deleted"
        );

        Ok(())
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }
}
