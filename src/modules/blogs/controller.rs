use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scribe_core::{AppError, PaginationParams};

use crate::middleware::auth::{AuthUser, RequireAdmin, requester_role};
use crate::modules::blogs::model::{
    BlogListResponse, BlogResponse, CreateBlogDto, UpdateBlogDto,
};
use crate::modules::blogs::service::BlogService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/blogs",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of blogs; drafts only for admins", body = BlogListResponse),
        (status = 401, description = "Invalid token")
    ),
    tag = "Blogs",
    security((), ("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_blogs(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<BlogListResponse>, AppError> {
    let role = requester_role(auth_user.as_ref());
    let blogs = BlogService::list(&state.db, state.cache(), role, params).await?;
    Ok(Json(blogs))
}

#[utoipa::path(
    get,
    path = "/api/blogs/user/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Author ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Page of the author's blogs", body = BlogListResponse),
        (status = 401, description = "Invalid token")
    ),
    tag = "Blogs",
    security((), ("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_blogs_by_user(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<BlogListResponse>, AppError> {
    let role = requester_role(auth_user.as_ref());
    let blogs = BlogService::list_by_user(&state.db, state.cache(), user_id, role, params).await?;
    Ok(Json(blogs))
}

#[utoipa::path(
    get,
    path = "/api/blogs/{slug}",
    params(
        ("slug" = String, Path, description = "Blog slug")
    ),
    responses(
        (status = 200, description = "Blog details", body = BlogResponse),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Draft not visible to the caller"),
        (status = 404, description = "Blog not found")
    ),
    tag = "Blogs",
    security((), ("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_blog_by_slug(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Json<BlogResponse>, AppError> {
    let viewer_id = auth_user.as_ref().map(AuthUser::user_id).transpose()?;
    let role = requester_role(auth_user.as_ref());

    let blog = BlogService::get_by_slug(&state.db, state.cache(), &slug, viewer_id, role).await?;
    Ok(Json(blog))
}

#[utoipa::path(
    post,
    path = "/api/blogs",
    request_body = CreateBlogDto,
    responses(
        (status = 201, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Blogs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_blog(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateBlogDto>,
) -> Result<(StatusCode, Json<BlogResponse>), AppError> {
    let author_id = admin.user_id()?;
    let blog = BlogService::create(&state.db, state.cache(), author_id, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(BlogResponse {
            blog,
            cached: false,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/blogs/{slug}",
    params(
        ("slug" = String, Path, description = "Blog slug")
    ),
    request_body = UpdateBlogDto,
    responses(
        (status = 200, description = "Blog updated", body = BlogResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author or an admin"),
        (status = 404, description = "Blog not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Blogs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_blog(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateBlogDto>,
) -> Result<Json<BlogResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let blog = BlogService::update(
        &state.db,
        state.cache(),
        &slug,
        user_id,
        auth_user.role(),
        dto,
    )
    .await?;

    Ok(Json(BlogResponse {
        blog,
        cached: false,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/blogs/{slug}",
    params(
        ("slug" = String, Path, description = "Blog slug")
    ),
    responses(
        (status = 204, description = "Blog deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author or an admin"),
        (status = 404, description = "Blog not found")
    ),
    tag = "Blogs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_blog(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = auth_user.user_id()?;
    BlogService::delete(&state.db, state.cache(), &slug, user_id, auth_user.role()).await?;
    Ok(StatusCode::NO_CONTENT)
}
