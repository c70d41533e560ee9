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

use super::model::{CreateUserDto, UpdateUserDto, User, UserWithRoles};
use super::service::UserService;

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/user",
    request_body = CreateUserDto,
    responses(
        (status = 200, description = "User created with its default role", body = UserWithRoles),
        (status = 400, description = "Username or email already exists")
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(dto): Json<CreateUserDto>,
) -> Result<Json<UserWithRoles>, AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    Ok(Json(user))
}

/// Current user's profile with resolved roles
#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserWithRoles),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserWithRoles>, AppError> {
    let user = UserService::get_user_with_roles(&state.db, auth_user.user_id()?).await?;
    Ok(Json(user))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 404, description = "No users found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_users(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserService::get_all_users(&state.db).await?;
    Ok(Json(users))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/user/{user_id}",
    responses(
        (status = 200, description = "User", body = UserWithRoles),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserWithRoles>, AppError> {
    let user = UserService::get_user_with_roles(&state.db, user_id).await?;
    Ok(Json(user))
}

/// Update a user (partial)
#[utoipa::path(
    put,
    path = "/api/user/{user_id}",
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(dto): Json<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user_by_id(&state.db, user_id, dto).await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/user/{user_id}",
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user_by_id(&state.db, user_id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
