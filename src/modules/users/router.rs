use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{delete_user, get_current_user, get_users, update_current_user};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users))
        .route("/current", get(get_current_user).patch(update_current_user))
        .route("/{user_id}", delete(delete_user))
}
