use std::sync::Arc;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::blogs::init_blogs_router;
use crate::modules::comments::init_comments_router;
use crate::modules::health::init_health_router;
use crate::modules::likes::init_likes_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

pub fn init_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .merge(init_health_router())
                .nest("/blogs", init_blogs_router())
                .nest("/comments", init_comments_router())
                .nest("/likes", init_likes_router())
                .nest("/users", init_users_router()),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        });

    if state.rate_limit_config.enabled {
        match state.rate_limit_config.governor_config() {
            Some(config) => {
                info!(
                    per_second = state.rate_limit_config.per_second,
                    burst_size = state.rate_limit_config.burst_size,
                    "Rate limiting enabled"
                );
                router = router.layer(GovernorLayer::new(Arc::new(config)));
            }
            None => warn!("Invalid rate limit settings, rate limiting disabled"),
        }
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
