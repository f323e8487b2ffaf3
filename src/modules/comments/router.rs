use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{create_comment, delete_comment, get_comments, get_comments_by_blog};

pub fn init_comments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_comments))
        .route(
            "/blog/{blog_id}",
            get(get_comments_by_blog).post(create_comment),
        )
        .route("/{comment_id}", delete(delete_comment))
}
