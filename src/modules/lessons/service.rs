use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{CreateLessonDto, Lesson, UpdateLessonDto};

const LESSON_COLUMNS: &str =
    "id, course_id, name, description, video_url, duration_minutes, created_at, updated_at";

#[instrument(skip(db, dto))]
pub async fn create_lesson(db: &PgPool, dto: CreateLessonDto) -> Result<Lesson, AppError> {
    let lesson = sqlx::query_as::<_, Lesson>(&format!(
        "INSERT INTO lessons (course_id, name, description, video_url, duration_minutes)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {LESSON_COLUMNS}"
    ))
    .bind(dto.course_id)
    .bind(&dto.name)
    .bind(&dto.description)
    .bind(&dto.video_url)
    .bind(dto.duration_minutes)
    .fetch_one(db)
    .await?;

    Ok(lesson)
}

#[instrument(skip(db))]
pub async fn get_all_lessons(db: &PgPool) -> Result<Vec<Lesson>, AppError> {
    let lessons =
        sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons ORDER BY name"))
            .fetch_all(db)
            .await?;

    Ok(lessons)
}

#[instrument(skip(db))]
pub async fn get_lesson_by_id(db: &PgPool, id: Uuid) -> Result<Lesson, AppError> {
    sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Lesson not found")))
}

#[instrument(skip(db, dto))]
pub async fn update_lesson(db: &PgPool, id: Uuid, dto: UpdateLessonDto) -> Result<Lesson, AppError> {
    let existing = get_lesson_by_id(db, id).await?;

    let lesson = sqlx::query_as::<_, Lesson>(&format!(
        "UPDATE lessons SET
             course_id = $1, name = $2, description = $3, video_url = $4,
             duration_minutes = $5, updated_at = NOW()
         WHERE id = $6
         RETURNING {LESSON_COLUMNS}"
    ))
    .bind(dto.course_id.or(existing.course_id))
    .bind(dto.name.unwrap_or(existing.name))
    .bind(dto.description.unwrap_or(existing.description))
    .bind(dto.video_url.unwrap_or(existing.video_url))
    .bind(dto.duration_minutes.unwrap_or(existing.duration_minutes))
    .bind(id)
    .fetch_one(db)
    .await?;

    Ok(lesson)
}

#[instrument(skip(db))]
pub async fn delete_lesson(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Lesson not found")));
    }

    Ok(())
}
