//! Cache key generation.
//!
//! Key layouts are shared with any other reader of the same store, so the
//! formats here must not change. Keys carry no global prefix.

use std::time::Duration;
use uuid::Uuid;

/// TTL for single blogs and blog lists.
pub const BLOG_TTL: Duration = Duration::from_secs(300);

/// TTL for comment lists.
pub const COMMENT_TTL: Duration = Duration::from_secs(3600);

/// TTL for user profiles.
pub const USER_TTL: Duration = Duration::from_secs(300);

/// Role segment used when the requester is anonymous.
pub const FALLBACK_ROLE: &str = "user";

fn role_segment(role: Option<&str>) -> &str {
    match role {
        Some(role) if !role.is_empty() => role,
        _ => FALLBACK_ROLE,
    }
}

/// Cache keys for blogs.
pub mod blogs {
    use super::*;

    /// `blog:slug:<slug>`
    pub fn by_slug(slug: &str) -> String {
        format!("blog:slug:{slug}")
    }

    /// `blogs:<role>:limit=<limit>:offset=<offset>`
    pub fn list(role: Option<&str>, limit: i64, offset: i64) -> String {
        format!(
            "blogs:{}:limit={limit}:offset={offset}",
            role_segment(role)
        )
    }

    /// `userBlogs:<author>:<role>:limit=<limit>:offset=<offset>`
    pub fn by_user(author_id: Uuid, role: Option<&str>, limit: i64, offset: i64) -> String {
        format!(
            "userBlogs:{author_id}:{}:limit={limit}:offset={offset}",
            role_segment(role)
        )
    }

    /// Every role and page of the global list.
    pub fn list_pattern() -> &'static str {
        "blogs:*"
    }

    /// Every role and page of one author's list.
    pub fn by_user_pattern(author_id: Uuid) -> String {
        format!("userBlogs:{author_id}:*")
    }

    /// Every author's list.
    pub fn all_users_pattern() -> &'static str {
        "userBlogs:*"
    }
}

/// Cache keys for comments.
pub mod comments {
    use super::*;

    /// `comments:offset:<offset>:limit:<limit>`
    pub fn list(offset: i64, limit: i64) -> String {
        format!("comments:offset:{offset}:limit:{limit}")
    }

    /// Pages of the global comment list. `None` matches any value.
    pub fn list_pattern(offset: Option<i64>, limit: Option<i64>) -> String {
        let offset = offset.map_or_else(|| "*".to_string(), |o| o.to_string());
        let limit = limit.map_or_else(|| "*".to_string(), |l| l.to_string());
        format!("comments:offset:{offset}:limit:{limit}")
    }

    /// `blog:comments:<blogId>`
    pub fn by_blog(blog_id: Uuid) -> String {
        format!("blog:comments:{blog_id}")
    }
}

/// Cache keys for users.
pub mod users {
    use super::*;

    /// `user:<id>`
    pub fn by_id(user_id: Uuid) -> String {
        format!("user:{user_id}")
    }

    /// The profile key and anything nested under it.
    pub fn invalidation_pattern(user_id: Uuid) -> String {
        format!("user:{user_id}*")
    }

    /// `user:email:<email>`
    pub fn by_email(email: &str) -> String {
        format!("user:email:{email}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::glob_match;
    use std::collections::HashSet;

    #[test]
    fn test_blog_keys() {
        assert_eq!(blogs::by_slug("my-post"), "blog:slug:my-post");
        assert_eq!(
            blogs::list(Some("admin"), 20, 0),
            "blogs:admin:limit=20:offset=0"
        );

        let id = Uuid::nil();
        assert_eq!(
            blogs::by_user(id, Some("user"), 10, 30),
            format!("userBlogs:{id}:user:limit=10:offset=30")
        );
    }

    #[test]
    fn test_anonymous_role_falls_back_to_user() {
        assert_eq!(blogs::list(None, 20, 0), blogs::list(Some("user"), 20, 0));
        assert_eq!(blogs::list(Some(""), 20, 0), "blogs:user:limit=20:offset=0");
    }

    #[test]
    fn test_comment_keys() {
        assert_eq!(comments::list(40, 20), "comments:offset:40:limit:20");
        assert_eq!(comments::list_pattern(None, None), "comments:offset:*:limit:*");
        assert_eq!(comments::list_pattern(Some(0), None), "comments:offset:0:limit:*");

        let id = Uuid::nil();
        assert_eq!(comments::by_blog(id), format!("blog:comments:{id}"));
    }

    #[test]
    fn test_user_keys() {
        let id = Uuid::nil();
        assert_eq!(users::by_id(id), format!("user:{id}"));
        assert_eq!(users::by_email("a@b.io"), "user:email:a@b.io");
        assert!(glob_match(&users::invalidation_pattern(id), &users::by_id(id)));
        assert!(!glob_match(&users::invalidation_pattern(id), &users::by_email("a@b.io")));
    }

    #[test]
    fn test_blog_list_key_deterministic_and_injective() {
        let mut seen = HashSet::new();
        for role in ["admin", "user"] {
            for limit in [1, 2, 10, 12, 20, 50] {
                for offset in [0, 1, 2, 12, 20, 120] {
                    let key = blogs::list(Some(role), limit, offset);
                    assert_eq!(key, blogs::list(Some(role), limit, offset));
                    assert!(seen.insert(key), "collision for {role}/{limit}/{offset}");
                }
            }
        }
        assert_eq!(seen.len(), 2 * 6 * 6);
    }

    #[test]
    fn test_patterns_cover_their_keys_only() {
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(glob_match(blogs::list_pattern(), &blogs::list(None, 20, 0)));
        assert!(!glob_match(blogs::list_pattern(), &blogs::by_slug("x")));
        assert!(!glob_match(blogs::list_pattern(), &blogs::by_user(author, None, 20, 0)));

        let pattern = blogs::by_user_pattern(author);
        assert!(glob_match(&pattern, &blogs::by_user(author, Some("admin"), 5, 10)));
        assert!(!glob_match(&pattern, &blogs::by_user(other, Some("admin"), 5, 10)));

        assert!(glob_match(&comments::list_pattern(None, None), &comments::list(0, 20)));
        assert!(!glob_match(&comments::list_pattern(None, None), &comments::by_blog(author)));
    }

    #[test]
    fn test_ttls() {
        assert_eq!(BLOG_TTL.as_secs(), 300);
        assert_eq!(COMMENT_TTL.as_secs(), 3600);
        assert_eq!(USER_TTL.as_secs(), 300);
    }
}
