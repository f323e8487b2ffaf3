use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{like_blog, unlike_blog};

pub fn init_likes_router() -> Router<AppState> {
    Router::new().route("/blog/{blog_id}", post(like_blog).delete(unlike_blog))
}
