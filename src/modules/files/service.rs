use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{CreateFileDto, File};

const FILE_COLUMNS: &str =
    "id, name, path, content_type, owner_id, course_id, lesson_id, created_at, updated_at";

#[instrument(skip(db, dto))]
pub async fn create_file(db: &PgPool, owner_id: Uuid, dto: CreateFileDto) -> Result<File, AppError> {
    let file = sqlx::query_as::<_, File>(&format!(
        "INSERT INTO files (name, path, content_type, owner_id, course_id, lesson_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {FILE_COLUMNS}"
    ))
    .bind(&dto.name)
    .bind(&dto.path)
    .bind(&dto.content_type)
    .bind(owner_id)
    .bind(dto.course_id)
    .bind(dto.lesson_id)
    .fetch_one(db)
    .await?;

    Ok(file)
}

#[instrument(skip(db))]
pub async fn get_all_files(db: &PgPool) -> Result<Vec<File>, AppError> {
    let files =
        sqlx::query_as::<_, File>(&format!("SELECT {FILE_COLUMNS} FROM files ORDER BY created_at"))
            .fetch_all(db)
            .await?;

    Ok(files)
}

#[instrument(skip(db))]
pub async fn get_file_by_id(db: &PgPool, id: Uuid) -> Result<File, AppError> {
    sqlx::query_as::<_, File>(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("File not found")))
}

#[instrument(skip(db))]
pub async fn delete_file(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM files WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("File not found")));
    }

    Ok(())
}
