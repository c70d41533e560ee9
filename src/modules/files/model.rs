use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Stored-file metadata; the bytes themselves live in external storage at
/// `path`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct File {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub content_type: String,
    pub owner_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFileDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub path: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub course_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}
