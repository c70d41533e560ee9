use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub video_url: String,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLessonDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub duration_minutes: i32,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLessonDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub course_id: Option<Uuid>,
}
