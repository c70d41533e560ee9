use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::model::MessageResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{CreateLessonDto, Lesson, UpdateLessonDto};
use super::service;

/// Create a lesson
#[utoipa::path(
    post,
    path = "/api/lesson",
    request_body = CreateLessonDto,
    responses((status = 200, description = "Lesson created", body = Lesson)),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_lesson(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(dto): Json<CreateLessonDto>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = service::create_lesson(&state.db, dto).await?;
    Ok(Json(lesson))
}

/// List all lessons
#[utoipa::path(
    get,
    path = "/api/lesson",
    responses((status = 200, description = "All lessons", body = Vec<Lesson>)),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_all_lessons(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = service::get_all_lessons(&state.db).await?;
    Ok(Json(lessons))
}

/// Get a lesson by id
#[utoipa::path(
    get,
    path = "/api/lesson/{lesson_id}",
    responses(
        (status = 200, description = "Lesson", body = Lesson),
        (status = 404, description = "Lesson not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_lesson(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = service::get_lesson_by_id(&state.db, lesson_id).await?;
    Ok(Json(lesson))
}

/// Update a lesson (partial)
#[utoipa::path(
    put,
    path = "/api/lesson/{lesson_id}",
    request_body = UpdateLessonDto,
    responses(
        (status = 200, description = "Updated lesson", body = Lesson),
        (status = 404, description = "Lesson not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn update_lesson(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(lesson_id): Path<Uuid>,
    Json(dto): Json<UpdateLessonDto>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = service::update_lesson(&state.db, lesson_id, dto).await?;
    Ok(Json(lesson))
}

/// Delete a lesson
#[utoipa::path(
    delete,
    path = "/api/lesson/{lesson_id}",
    responses(
        (status = 200, description = "Lesson deleted", body = MessageResponse),
        (status = 404, description = "Lesson not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_lesson(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::delete_lesson(&state.db, lesson_id).await?;
    Ok(Json(MessageResponse {
        message: "Lesson deleted successfully".to_string(),
    }))
}
