use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::permission::{
    RequireRolesCreate, RequireRolesDelete, RequireRolesEdit, RequireRolesRead,
};
use crate::modules::auth::model::MessageResponse;
use crate::modules::users::model::UserWithRoles;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{
    AssignRoleDto, CreatePermissionDto, CreateRoleDto, Permission, RoleWithPermissions,
    UpdatePermissionDto, UpdateRoleDto,
};
use super::service;

// ============ Permission Handlers ============

/// Create a new permission
#[utoipa::path(
    post,
    path = "/api/permission",
    request_body = CreatePermissionDto,
    responses(
        (status = 200, description = "Permission created", body = Permission),
        (status = 400, description = "Permission already exists")
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn create_permission(
    State(state): State<AppState>,
    Json(dto): Json<CreatePermissionDto>,
) -> Result<Json<Permission>, AppError> {
    let permission = service::create_permission(&state.db, dto).await?;
    Ok(Json(permission))
}

/// List all permissions
#[utoipa::path(
    get,
    path = "/api/permission",
    responses((status = 200, description = "All permissions", body = Vec<Permission>)),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn get_all_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let permissions = service::get_all_permissions(&state.db).await?;
    Ok(Json(permissions))
}

/// Get a permission by id
#[utoipa::path(
    get,
    path = "/api/permission/{permission_id}",
    responses(
        (status = 200, description = "Permission", body = Permission),
        (status = 404, description = "Permission not found")
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn get_permission_by_id(
    State(state): State<AppState>,
    Path(permission_id): Path<Uuid>,
) -> Result<Json<Permission>, AppError> {
    let permission = service::get_permission_by_id(&state.db, permission_id).await?;
    Ok(Json(permission))
}

/// Update a permission
#[utoipa::path(
    put,
    path = "/api/permission/{permission_id}",
    request_body = UpdatePermissionDto,
    responses(
        (status = 200, description = "Updated permission", body = Permission),
        (status = 404, description = "Permission not found")
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn update_permission(
    State(state): State<AppState>,
    Path(permission_id): Path<Uuid>,
    Json(dto): Json<UpdatePermissionDto>,
) -> Result<Json<Permission>, AppError> {
    let permission = service::update_permission(&state.db, permission_id, dto).await?;
    Ok(Json(permission))
}

/// Delete a permission
#[utoipa::path(
    delete,
    path = "/api/permission/{permission_id}",
    responses(
        (status = 200, description = "Permission deleted", body = MessageResponse),
        (status = 404, description = "Permission not found")
    ),
    tag = "Permissions"
)]
#[instrument(skip(state))]
pub async fn delete_permission(
    State(state): State<AppState>,
    Path(permission_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::delete_permission(&state.db, permission_id).await?;
    Ok(Json(MessageResponse {
        message: "Permission deleted successfully".to_string(),
    }))
}

// ============ Role Handlers ============

/// Create a new role from existing permission names
#[utoipa::path(
    post,
    path = "/api/role",
    request_body = CreateRoleDto,
    responses(
        (status = 200, description = "Role created", body = RoleWithPermissions),
        (status = 400, description = "Role exists or permission unknown"),
        (status = 403, description = "Not enough permissions")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state, _guard))]
pub async fn create_role(
    State(state): State<AppState>,
    _guard: RequireRolesCreate,
    Json(dto): Json<CreateRoleDto>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    let role = service::create_role(&state.db, &dto.name, &dto.description, &dto.permissions).await?;
    Ok(Json(role))
}

/// List all roles with their permissions
#[utoipa::path(
    get,
    path = "/api/role",
    responses(
        (status = 200, description = "All roles", body = Vec<RoleWithPermissions>),
        (status = 403, description = "Not enough permissions")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state, _guard))]
pub async fn get_all_roles(
    State(state): State<AppState>,
    _guard: RequireRolesRead,
) -> Result<Json<Vec<RoleWithPermissions>>, AppError> {
    let roles = service::get_all_roles(&state.db).await?;
    Ok(Json(roles))
}

/// Get a role by id
#[utoipa::path(
    get,
    path = "/api/role/{role_id}",
    responses(
        (status = 200, description = "Role", body = RoleWithPermissions),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state, _guard))]
pub async fn get_role_by_id(
    State(state): State<AppState>,
    _guard: RequireRolesRead,
    Path(role_id): Path<Uuid>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    let role = service::get_role_by_id(&state.db, role_id).await?;
    Ok(Json(role))
}

/// Update a role
#[utoipa::path(
    put,
    path = "/api/role/{role_id}",
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Updated role", body = RoleWithPermissions),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state, _guard))]
pub async fn update_role(
    State(state): State<AppState>,
    _guard: RequireRolesEdit,
    Path(role_id): Path<Uuid>,
    Json(dto): Json<UpdateRoleDto>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    let role = service::update_role(&state.db, role_id, dto).await?;
    Ok(Json(role))
}

/// Delete a role
#[utoipa::path(
    delete,
    path = "/api/role/{role_id}",
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state, _guard))]
pub async fn delete_role(
    State(state): State<AppState>,
    _guard: RequireRolesDelete,
    Path(role_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::delete_role(&state.db, role_id).await?;
    Ok(Json(MessageResponse {
        message: "Role deleted successfully".to_string(),
    }))
}

/// Assign a role to a user by role name
#[utoipa::path(
    post,
    path = "/api/role/users/{user_id}/roles",
    request_body = AssignRoleDto,
    responses(
        (status = 200, description = "User with updated roles", body = UserWithRoles),
        (status = 404, description = "Role or user not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state, _guard))]
pub async fn assign_role(
    State(state): State<AppState>,
    _guard: RequireRolesCreate,
    Path(user_id): Path<Uuid>,
    Json(dto): Json<AssignRoleDto>,
) -> Result<Json<UserWithRoles>, AppError> {
    // Ensure the user exists before touching assignments
    UserService::get_user_by_id(&state.db, user_id).await?;
    service::assign_role_to_user(&state.db, user_id, &dto.role_name).await?;

    let user = UserService::get_user_with_roles(&state.db, user_id).await?;
    Ok(Json(user))
}
