use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::modules::health::model::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "API is live", body = HealthResponse)
    ),
    tag = "Health"
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state
        .cache()
        .map(|c| c.backend_name())
        .unwrap_or("disabled");

    Json(HealthResponse {
        message: "API is live".to_string(),
        status: "OK".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: cache.to_string(),
        timestamp: Utc::now(),
    })
}
