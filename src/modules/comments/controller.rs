use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scribe_core::{AppError, PaginationParams};

use crate::middleware::auth::AuthUser;
use crate::modules::comments::model::{
    BlogCommentsResponse, CommentListResponse, CommentResponse, CreateCommentDto,
};
use crate::modules::comments::service::CommentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/comments",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of the comment feed", body = CommentListResponse),
        (status = 401, description = "Invalid token")
    ),
    tag = "Comments",
    security((), ("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_comments(
    State(state): State<AppState>,
    _auth_user: Option<AuthUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<CommentListResponse>, AppError> {
    let comments = CommentService::list(&state.db, state.cache(), params).await?;
    Ok(Json(comments))
}

#[utoipa::path(
    get,
    path = "/api/comments/blog/{blog_id}",
    params(
        ("blog_id" = Uuid, Path, description = "Blog ID")
    ),
    responses(
        (status = 200, description = "Comments on the blog, newest first", body = BlogCommentsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Blog not found")
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_comments_by_blog(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(blog_id): Path<Uuid>,
) -> Result<Json<BlogCommentsResponse>, AppError> {
    let comments = CommentService::list_by_blog(&state.db, state.cache(), blog_id).await?;
    Ok(Json(comments))
}

#[utoipa::path(
    post,
    path = "/api/comments/blog/{blog_id}",
    params(
        ("blog_id" = Uuid, Path, description = "Blog ID")
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Blog is a draft the caller cannot see"),
        (status = 404, description = "Blog not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(blog_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateCommentDto>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let user_id = auth_user.user_id()?;
    let comment = CommentService::create(
        &state.db,
        state.cache(),
        blog_id,
        user_id,
        auth_user.role(),
        dto,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{comment_id}",
    params(
        ("comment_id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the comment owner or an admin"),
        (status = 404, description = "Comment not found")
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = auth_user.user_id()?;
    CommentService::delete(
        &state.db,
        state.cache(),
        comment_id,
        user_id,
        auth_user.role(),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
