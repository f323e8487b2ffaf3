//! Limit/offset pagination for list endpoints.
//!
//! - `limit`: Maximum number of items to return (1-50, default: 20)
//! - `offset`: Number of items to skip (minimum 0, default: 0)
//!
//! Cache keys are built from the effective values, so `?limit=500` and
//! `?limit=50` share one cache entry.
//!
//! # Example
//!
//! ```ignore
//! async fn list_blogs(
//!     Query(params): Query<PaginationParams>,
//! ) -> Result<Json<BlogListResponse>, AppError> {
//!     let limit = params.limit();
//!     let offset = params.offset();
//!
//!     let blogs = fetch_blogs(limit, offset).await?;
//!     let total = count_blogs().await?;
//!
//!     Ok(Json(BlogListResponse {
//!         data: blogs,
//!         meta: PaginationMeta::new(total, limit, offset),
//!     }))
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 50;

/// Treats empty query values (`?limit=`) as absent.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata about a paginated response.
///
/// ```json
/// { "total": 100, "limit": 20, "offset": 40, "has_more": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// The limit that was applied
    pub limit: i64,
    /// Number of items skipped
    pub offset: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// Query parameters for pagination.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-50, default: 20)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Returns the effective limit, clamped to [1, 50].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Returns the effective offset, never negative.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
