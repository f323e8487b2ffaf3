//! Blog post data models and DTOs.
//!
//! [`BlogRow`] is what PostgreSQL returns (post joined with its author);
//! [`Blog`] is what the API and the cache carry. The cached form keeps
//! `status` and `author.id` so visibility can be re-checked on every hit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use scribe_auth::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Published => "published",
        }
    }

    /// Maps the `status` column. Anything unexpected is treated as a draft
    /// so it stays hidden.
    pub fn from_db(value: &str) -> Self {
        match value {
            "published" => BlogStatus::Published,
            _ => BlogStatus::Draft,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BlogRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub banner_url: Option<String>,
    pub status: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
    pub views_count: i32,
    pub likes_count: i32,
    pub comments_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BlogAuthor {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub banner_url: Option<String>,
    pub status: BlogStatus,
    pub author: BlogAuthor,
    pub views_count: i32,
    pub likes_count: i32,
    pub comments_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        Blog {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            banner_url: row.banner_url,
            status: BlogStatus::from_db(&row.status),
            author: BlogAuthor {
                id: row.author_id,
                username: row.author_username,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
            },
            views_count: row.views_count,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Blog {
    /// Published posts are public. Drafts are visible to admins and to
    /// their author only.
    pub fn is_visible_to(&self, viewer_id: Option<Uuid>, role: UserRole) -> bool {
        self.status == BlogStatus::Published
            || role.is_admin()
            || viewer_id.is_some_and(|id| id == self.author.id)
    }

    pub fn is_editable_by(&self, user_id: Uuid, role: UserRole) -> bool {
        role.is_admin() || self.author.id == user_id
    }
}

/// The columns needed to authorize a write against a post and to
/// invalidate its cached views afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct BlogRef {
    pub id: Uuid,
    pub slug: String,
    pub status: String,
    pub author_id: Uuid,
}

impl BlogRef {
    pub fn is_visible_to(&self, user_id: Uuid, role: UserRole) -> bool {
        BlogStatus::from_db(&self.status) == BlogStatus::Published
            || role.is_admin()
            || self.author_id == user_id
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlogDto {
    #[validate(length(min = 1, max = 180, message = "Title must be 1-180 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[validate(url(message = "Banner URL must be a valid URL"))]
    pub banner_url: Option<String>,
    pub status: Option<BlogStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBlogDto {
    #[validate(length(min = 1, max = 180, message = "Title must be 1-180 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
    #[validate(url(message = "Banner URL must be a valid URL"))]
    pub banner_url: Option<String>,
    pub status: Option<BlogStatus>,
}

/// A single post. `cached` is present and `true` when served from cache.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlogResponse {
    pub blog: Blog,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlogListResponse {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
    pub blogs: Vec<Blog>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// Payload stored under the list cache keys.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachedBlogPage {
    pub total: i64,
    pub blogs: Vec<Blog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog(status: BlogStatus, author_id: Uuid) -> Blog {
        let now = Utc::now();
        Blog {
            id: Uuid::new_v4(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            content: "<p>hi</p>".to_string(),
            banner_url: None,
            status,
            author: BlogAuthor {
                id: author_id,
                username: "ada".to_string(),
                first_name: None,
                last_name: None,
            },
            views_count: 0,
            likes_count: 0,
            comments_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_published_visible_to_everyone() {
        let post = blog(BlogStatus::Published, Uuid::new_v4());
        assert!(post.is_visible_to(None, UserRole::User));
        assert!(post.is_visible_to(Some(Uuid::new_v4()), UserRole::User));
    }

    #[test]
    fn test_draft_visibility() {
        let author = Uuid::new_v4();
        let post = blog(BlogStatus::Draft, author);

        assert!(!post.is_visible_to(None, UserRole::User));
        assert!(!post.is_visible_to(Some(Uuid::new_v4()), UserRole::User));
        assert!(post.is_visible_to(Some(author), UserRole::User));
        assert!(post.is_visible_to(None, UserRole::Admin));
    }

    #[test]
    fn test_editable_by_author_or_admin() {
        let author = Uuid::new_v4();
        let post = blog(BlogStatus::Published, author);

        assert!(post.is_editable_by(author, UserRole::User));
        assert!(post.is_editable_by(Uuid::new_v4(), UserRole::Admin));
        assert!(!post.is_editable_by(Uuid::new_v4(), UserRole::User));
    }

    #[test]
    fn test_blog_ref_visibility() {
        let author = Uuid::new_v4();
        let draft = BlogRef {
            id: Uuid::new_v4(),
            slug: "wip".to_string(),
            status: "draft".to_string(),
            author_id: author,
        };
        assert!(draft.is_visible_to(author, UserRole::User));
        assert!(draft.is_visible_to(Uuid::new_v4(), UserRole::Admin));
        assert!(!draft.is_visible_to(Uuid::new_v4(), UserRole::User));

        let published = BlogRef {
            status: "published".to_string(),
            ..draft
        };
        assert!(published.is_visible_to(Uuid::new_v4(), UserRole::User));
    }

    #[test]
    fn test_status_from_db() {
        assert_eq!(BlogStatus::from_db("published"), BlogStatus::Published);
        assert_eq!(BlogStatus::from_db("draft"), BlogStatus::Draft);
        assert_eq!(BlogStatus::from_db("archived"), BlogStatus::Draft);
    }

    #[test]
    fn test_cached_flag_omitted_when_false() {
        let response = BlogResponse {
            blog: blog(BlogStatus::Published, Uuid::new_v4()),
            cached: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("cached").is_none());
        assert_eq!(json["blog"]["status"], "published");
    }

    #[test]
    fn test_create_dto_validation() {
        let dto = CreateBlogDto {
            title: String::new(),
            content: "body".to_string(),
            banner_url: Some("not a url".to_string()),
            status: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("banner_url"));
    }
}
