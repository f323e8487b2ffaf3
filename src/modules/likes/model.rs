use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeResponse {
    pub blog_id: Uuid,
    pub likes_count: i32,
}
