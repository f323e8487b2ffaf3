use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    /// `redis`, `memory`, or `disabled` when running without a cache.
    pub cache: String,
    pub timestamp: DateTime<Utc>,
}
