use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use scribe_auth::{Claims, UserRole, verify_token};
use scribe_core::AppError;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides the caller's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.0
            .user_id()
            .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid user ID in token")))
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.role.is_admin()
    }
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let value = parts.headers.get(header::AUTHORIZATION)?;
    Some(
        value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid authorization header format"))),
    )
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized(anyhow!("Missing authorization header")))??;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// `Option<AuthUser>` for routes open to anonymous readers.
///
/// A missing header yields `None`; a header carrying a bad token is still
/// rejected with `401`.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => {
                let claims = verify_token(token?, &state.jwt_config)?;
                Ok(Some(AuthUser(claims)))
            }
        }
    }
}

/// Admin-only extractor. Rejects authenticated non-admins with `403`.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user =
            <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;

        if !auth_user.is_admin() {
            return Err(AppError::forbidden(anyhow!("Admin access required")));
        }

        Ok(RequireAdmin(auth_user))
    }
}

/// Role used to build role-scoped cache keys. Anonymous callers are users.
pub fn requester_role(auth_user: Option<&AuthUser>) -> UserRole {
    auth_user.map(AuthUser::role).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: UserRole) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "reader@example.com".to_string(),
            role,
            exp: usize::MAX,
            iat: 0,
        }
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_user_id_parses_subject() {
        let id = Uuid::new_v4();
        let user = AuthUser(claims(&id.to_string(), UserRole::User));
        assert_eq!(user.user_id().unwrap(), id);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_user_id_rejects_garbage_subject() {
        let user = AuthUser(claims("not-a-uuid", UserRole::Admin));
        assert_eq!(user.user_id().unwrap_err().status.as_u16(), 401);
        assert!(user.is_admin());
    }

    #[test]
    fn test_requester_role_defaults_to_user() {
        assert_eq!(requester_role(None), UserRole::User);
        let admin = AuthUser(claims("x", UserRole::Admin));
        assert_eq!(requester_role(Some(&admin)), UserRole::Admin);
    }

    #[test]
    fn test_bearer_token() {
        assert!(bearer_token(&parts_with(None)).is_none());
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer abc"))).map(|r| r.ok()),
            Some(Some("abc"))
        );
        assert!(matches!(
            bearer_token(&parts_with(Some("Basic abc"))),
            Some(Err(_))
        ));
    }
}
