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

use super::model::{Course, CreateCourseDto, UpdateCourseDto};
use super::service;

/// Create a course
#[utoipa::path(
    post,
    path = "/api/course",
    request_body = CreateCourseDto,
    responses((status = 200, description = "Course created", body = Course)),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(dto): Json<CreateCourseDto>,
) -> Result<Json<Course>, AppError> {
    let course = service::create_course(&state.db, dto).await?;
    Ok(Json(course))
}

/// List all courses
#[utoipa::path(
    get,
    path = "/api/course",
    responses((status = 200, description = "All courses", body = Vec<Course>)),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_all_courses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = service::get_all_courses(&state.db).await?;
    Ok(Json(courses))
}

/// Get a course by id
#[utoipa::path(
    get,
    path = "/api/course/{course_id}",
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_course(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = service::get_course_by_id(&state.db, course_id).await?;
    Ok(Json(course))
}

/// Update a course (partial)
#[utoipa::path(
    put,
    path = "/api/course/{course_id}",
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Updated course", body = Course),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(dto): Json<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    let course = service::update_course(&state.db, course_id, dto).await?;
    Ok(Json(course))
}

/// Delete a course
#[utoipa::path(
    delete,
    path = "/api/course/{course_id}",
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_course(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::delete_course(&state.db, course_id).await?;
    Ok(Json(MessageResponse {
        message: "Course deleted successfully".to_string(),
    }))
}

/// Enroll the calling user into a course
#[utoipa::path(
    post,
    path = "/api/course/{course_id}/enroll",
    responses(
        (status = 200, description = "Enrollment confirmed", body = MessageResponse),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, auth_user))]
pub async fn enroll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::enroll_student(&state.db, course_id, auth_user.user_id()?).await?;
    Ok(Json(MessageResponse {
        message: "Enrolled successfully".to_string(),
    }))
}
