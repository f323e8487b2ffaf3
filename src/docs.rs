use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use scribe_auth::UserRole;
use scribe_core::{PaginationMeta, PaginationParams};

use crate::modules::blogs::model::{
    Blog, BlogAuthor, BlogListResponse, BlogResponse, BlogStatus, CreateBlogDto, UpdateBlogDto,
};
use crate::modules::comments::model::{
    BlogCommentsResponse, Comment, CommentBlog, CommentListResponse, CommentResponse,
    CommentUser, CreateCommentDto,
};
use crate::modules::health::model::HealthResponse;
use crate::modules::likes::model::LikeResponse;
use crate::modules::users::model::{UpdateCurrentUserDto, User, UserListResponse, UserResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health,
        crate::modules::blogs::controller::get_blogs,
        crate::modules::blogs::controller::get_blogs_by_user,
        crate::modules::blogs::controller::get_blog_by_slug,
        crate::modules::blogs::controller::create_blog,
        crate::modules::blogs::controller::update_blog,
        crate::modules::blogs::controller::delete_blog,
        crate::modules::comments::controller::get_comments,
        crate::modules::comments::controller::get_comments_by_blog,
        crate::modules::comments::controller::create_comment,
        crate::modules::comments::controller::delete_comment,
        crate::modules::likes::controller::like_blog,
        crate::modules::likes::controller::unlike_blog,
        crate::modules::users::controller::get_current_user,
        crate::modules::users::controller::update_current_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::delete_user,
    ),
    components(
        schemas(
            HealthResponse,
            Blog,
            BlogAuthor,
            BlogStatus,
            BlogResponse,
            BlogListResponse,
            CreateBlogDto,
            UpdateBlogDto,
            Comment,
            CommentBlog,
            CommentUser,
            CommentResponse,
            CommentListResponse,
            BlogCommentsResponse,
            CreateCommentDto,
            LikeResponse,
            User,
            UserRole,
            UserResponse,
            UserListResponse,
            UpdateCurrentUserDto,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Blogs", description = "Blog posts, cached per role and page"),
        (name = "Comments", description = "Comments on blog posts"),
        (name = "Likes", description = "Likes on blog posts"),
        (name = "Users", description = "User profiles and administration")
    ),
    info(
        title = "Scribe API",
        version = "0.1.0",
        description = "Blogging backend built with Rust, Axum and PostgreSQL, with a Redis read-through cache.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes_and_security() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api",
            "/api/blogs",
            "/api/blogs/{slug}",
            "/api/blogs/user/{user_id}",
            "/api/comments",
            "/api/comments/blog/{blog_id}",
            "/api/comments/{comment_id}",
            "/api/likes/blog/{blog_id}",
            "/api/users",
            "/api/users/current",
            "/api/users/{user_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
