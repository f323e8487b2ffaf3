use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scribe_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::likes::model::LikeResponse;
use crate::modules::likes::service::LikeService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/likes/blog/{blog_id}",
    params(
        ("blog_id" = Uuid, Path, description = "Blog ID")
    ),
    responses(
        (status = 201, description = "Blog liked", body = LikeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Blog is a draft the caller cannot see"),
        (status = 404, description = "Blog not found"),
        (status = 409, description = "Blog already liked")
    ),
    tag = "Likes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn like_blog(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(blog_id): Path<Uuid>,
) -> Result<(StatusCode, Json<LikeResponse>), AppError> {
    let user_id = auth_user.user_id()?;
    let like =
        LikeService::like(&state.db, state.cache(), blog_id, user_id, auth_user.role()).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

#[utoipa::path(
    delete,
    path = "/api/likes/blog/{blog_id}",
    params(
        ("blog_id" = Uuid, Path, description = "Blog ID")
    ),
    responses(
        (status = 204, description = "Like removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Like not found")
    ),
    tag = "Likes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn unlike_blog(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(blog_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = auth_user.user_id()?;
    LikeService::unlike(&state.db, state.cache(), blog_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
