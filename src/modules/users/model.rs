//! User data models and DTOs.
//!
//! Accounts are provisioned by the identity service; this API reads them,
//! lets users edit their own profile and lets admins remove accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use scribe_auth::UserRole;
use scribe_core::PaginationMeta;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            // The column is constrained to admin|user.
            role: row.role.parse().unwrap_or_default(),
            website: row.website,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Profile changes for the calling user. Omitted fields are left as they are.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCurrentUserDto {
    #[validate(length(min = 1, max = 20, message = "Username must be 1-20 characters"))]
    pub username: Option<String>,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "First name must be at most 20 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 20, message = "Last name must be at most 20 characters"))]
    pub last_name: Option<String>,
    #[validate(
        url(message = "Invalid website URL"),
        length(max = 100, message = "Website must be at most 100 characters")
    )]
    pub website: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub users: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            role: role.to_string(),
            website: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_mapping() {
        assert_eq!(User::from(row("admin")).role, UserRole::Admin);
        assert_eq!(User::from(row("user")).role, UserRole::User);
        assert_eq!(User::from(row("unexpected")).role, UserRole::User);
    }

    #[test]
    fn test_update_dto_accepts_empty_patch() {
        assert!(UpdateCurrentUserDto::default().validate().is_ok());
    }

    #[test]
    fn test_update_dto_validation() {
        let dto = UpdateCurrentUserDto {
            username: Some("a".repeat(21)),
            email: Some("not-an-email".to_string()),
            website: Some("example".to_string()),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("website"));
    }
}
