use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scribe_core::{AppError, PaginationParams};

use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::users::model::{UpdateCurrentUserDto, UserListResponse, UserResponse};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Get the calling user's profile
#[utoipa::path(
    get,
    path = "/api/users/current",
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized - missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let user = UserService::get_current(&state.db, state.cache(), user_id).await?;
    Ok(Json(user))
}

/// Update the calling user's profile
#[utoipa::path(
    patch,
    path = "/api/users/current",
    request_body = UpdateCurrentUserDto,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Unauthorized - missing or invalid token"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already in use"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateCurrentUserDto>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let user = UserService::update_current(&state.db, state.cache(), user_id, dto).await?;
    Ok(Json(UserResponse {
        user,
        cached: false,
    }))
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users", body = UserListResponse),
        (status = 401, description = "Unauthorized - missing or invalid token"),
        (status = 403, description = "Admin access required")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<PaginationParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = UserService::list(&state.db, params).await?;
    Ok(Json(users))
}

/// Delete a user and everything they authored (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized - missing or invalid token"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    UserService::delete(&state.db, state.cache(), user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
