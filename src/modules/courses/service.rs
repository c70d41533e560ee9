use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{Course, CreateCourseDto, UpdateCourseDto};

const COURSE_COLUMNS: &str = "id, name, description, price_cents, status, teacher_id, \
     duration_minutes, discount_percent, topics, level, rating, created_at, updated_at";

#[instrument(skip(db, dto))]
pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (name, description, price_cents, teacher_id, duration_minutes, topics, level)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {COURSE_COLUMNS}"
    ))
    .bind(&dto.name)
    .bind(&dto.description)
    .bind(dto.price_cents)
    .bind(dto.teacher_id)
    .bind(dto.duration_minutes)
    .bind(&dto.topics)
    .bind(&dto.level)
    .fetch_one(db)
    .await?;

    Ok(course)
}

#[instrument(skip(db))]
pub async fn get_all_courses(db: &PgPool) -> Result<Vec<Course>, AppError> {
    let courses =
        sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY name"))
            .fetch_all(db)
            .await?;

    Ok(courses)
}

#[instrument(skip(db))]
pub async fn get_course_by_id(db: &PgPool, id: Uuid) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
}

#[instrument(skip(db, dto))]
pub async fn update_course(db: &PgPool, id: Uuid, dto: UpdateCourseDto) -> Result<Course, AppError> {
    let existing = get_course_by_id(db, id).await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
             name = $1, description = $2, price_cents = $3, status = $4, teacher_id = $5,
             duration_minutes = $6, discount_percent = $7, topics = $8, level = $9,
             updated_at = NOW()
         WHERE id = $10
         RETURNING {COURSE_COLUMNS}"
    ))
    .bind(dto.name.unwrap_or(existing.name))
    .bind(dto.description.unwrap_or(existing.description))
    .bind(dto.price_cents.unwrap_or(existing.price_cents))
    .bind(dto.status.unwrap_or(existing.status))
    .bind(dto.teacher_id.or(existing.teacher_id))
    .bind(dto.duration_minutes.unwrap_or(existing.duration_minutes))
    .bind(dto.discount_percent.unwrap_or(existing.discount_percent))
    .bind(dto.topics.unwrap_or(existing.topics))
    .bind(dto.level.unwrap_or(existing.level))
    .bind(id)
    .fetch_one(db)
    .await?;

    Ok(course)
}

#[instrument(skip(db))]
pub async fn delete_course(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Course not found")));
    }

    Ok(())
}

/// Enroll a student; enrolling twice is a no-op.
#[instrument(skip(db))]
pub async fn enroll_student(db: &PgPool, course_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    get_course_by_id(db, course_id).await?;

    sqlx::query(
        "INSERT INTO course_students (course_id, user_id) VALUES ($1, $2)
         ON CONFLICT (course_id, user_id) DO NOTHING",
    )
    .bind(course_id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(())
}
