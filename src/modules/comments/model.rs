use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub content: String,
    pub blog_id: Uuid,
    pub blog_title: String,
    pub blog_slug: String,
    pub user_id: Uuid,
    pub user_username: String,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommentBlog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommentUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub blog: CommentBlog,
    pub user: CommentUser,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            content: row.content,
            blog: CommentBlog {
                id: row.blog_id,
                title: row.blog_title,
                slug: row.blog_slug,
            },
            user: CommentUser {
                id: row.user_id,
                username: row.user_username,
                first_name: row.user_first_name,
                last_name: row.user_last_name,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 1000, message = "Content must be 1-1000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub comment: Comment,
}

/// Page of the global comment feed. Cached as-is; `cached` is only set on
/// the way out.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentListResponse {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlogCommentsResponse {
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length_limits() {
        let empty = CreateCommentDto {
            content: String::new(),
        };
        assert!(empty.validate().is_err());

        let max = CreateCommentDto {
            content: "a".repeat(1000),
        };
        assert!(max.validate().is_ok());

        let too_long = CreateCommentDto {
            content: "a".repeat(1001),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_cached_page_round_trips_without_flag() {
        let page = CommentListResponse {
            offset: 0,
            limit: 20,
            total: 0,
            comments: vec![],
            cached: false,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.contains("cached"));

        let back: CommentListResponse = serde_json::from_str(&json).unwrap();
        assert!(!back.cached);
        assert_eq!(back.limit, 20);
    }
}
