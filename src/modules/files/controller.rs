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

use super::model::{CreateFileDto, File};
use super::service;

/// Register file metadata owned by the caller
#[utoipa::path(
    post,
    path = "/api/file",
    request_body = CreateFileDto,
    responses((status = 200, description = "File registered", body = File)),
    security(("bearer_auth" = [])),
    tag = "Files"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_file(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(dto): Json<CreateFileDto>,
) -> Result<Json<File>, AppError> {
    let file = service::create_file(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(file))
}

/// List all files
#[utoipa::path(
    get,
    path = "/api/file",
    responses((status = 200, description = "All files", body = Vec<File>)),
    security(("bearer_auth" = [])),
    tag = "Files"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_all_files(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<File>>, AppError> {
    let files = service::get_all_files(&state.db).await?;
    Ok(Json(files))
}

/// Get file metadata by id
#[utoipa::path(
    get,
    path = "/api/file/{file_id}",
    responses(
        (status = 200, description = "File", body = File),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Files"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_file(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<File>, AppError> {
    let file = service::get_file_by_id(&state.db, file_id).await?;
    Ok(Json(file))
}

/// Delete file metadata
#[utoipa::path(
    delete,
    path = "/api/file/{file_id}",
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Files"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_file(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::delete_file(&state.db, file_id).await?;
    Ok(Json(MessageResponse {
        message: "File deleted successfully".to_string(),
    }))
}
