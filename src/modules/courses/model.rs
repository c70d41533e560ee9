use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub status: String,
    pub teacher_id: Option<Uuid>,
    pub duration_minutes: i32,
    pub discount_percent: i32,
    pub topics: Vec<String>,
    pub level: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price_cents: i64,
    pub teacher_id: Option<Uuid>,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "beginner".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub status: Option<String>,
    pub teacher_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
    pub discount_percent: Option<i32>,
    pub topics: Option<Vec<String>>,
    pub level: Option<String>,
}
