use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_blog, delete_blog, get_blog_by_slug, get_blogs, get_blogs_by_user, update_blog,
};

pub fn init_blogs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_blogs).post(create_blog))
        .route("/user/{user_id}", get(get_blogs_by_user))
        .route(
            "/{slug}",
            get(get_blog_by_slug).put(update_blog).delete(delete_blog),
        )
}
