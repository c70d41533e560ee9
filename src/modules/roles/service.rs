use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{
    CreatePermissionDto, Permission, Role, RoleWithPermissions, UpdatePermissionDto, UpdateRoleDto,
};

// ============ Permission Services ============

#[instrument(skip(db))]
pub async fn get_all_permissions(db: &PgPool) -> Result<Vec<Permission>, AppError> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT id, name, description, created_at, updated_at FROM permissions ORDER BY name",
    )
    .fetch_all(db)
    .await?;

    Ok(permissions)
}

#[instrument(skip(db))]
pub async fn get_permission_by_id(db: &PgPool, id: Uuid) -> Result<Permission, AppError> {
    sqlx::query_as::<_, Permission>(
        "SELECT id, name, description, created_at, updated_at FROM permissions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Permission not found")))
}

#[instrument(skip(db))]
pub async fn get_permission_by_name(
    db: &PgPool,
    name: &str,
) -> Result<Option<Permission>, AppError> {
    let permission = sqlx::query_as::<_, Permission>(
        "SELECT id, name, description, created_at, updated_at FROM permissions WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(db)
    .await?;

    Ok(permission)
}

#[instrument(skip(db))]
pub async fn create_permission(
    db: &PgPool,
    dto: CreatePermissionDto,
) -> Result<Permission, AppError> {
    sqlx::query_as::<_, Permission>(
        "INSERT INTO permissions (name, description)
         VALUES ($1, $2)
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(&dto.name)
    .bind(&dto.description)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::bad_request(anyhow!("Permission already exists"));
            }
        }
        AppError::from(e)
    })
}

/// Upsert-or-fetch: concurrent callers racing on the same name all end up
/// with the one persisted row.
#[instrument(skip(db))]
pub async fn get_or_create_permission(
    db: &PgPool,
    name: &str,
    description: &str,
) -> Result<Permission, AppError> {
    let inserted = sqlx::query_as::<_, Permission>(
        "INSERT INTO permissions (name, description)
         VALUES ($1, $2)
         ON CONFLICT (name) DO NOTHING
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(name)
    .bind(description)
    .fetch_optional(db)
    .await?;

    if let Some(permission) = inserted {
        return Ok(permission);
    }

    get_permission_by_name(db, name)
        .await?
        .ok_or_else(|| AppError::internal(anyhow!("Permission {} vanished during upsert", name)))
}

#[instrument(skip(db))]
pub async fn update_permission(
    db: &PgPool,
    id: Uuid,
    dto: UpdatePermissionDto,
) -> Result<Permission, AppError> {
    let existing = get_permission_by_id(db, id).await?;

    let name = dto.name.unwrap_or(existing.name);
    let description = dto.description.unwrap_or(existing.description);

    sqlx::query_as::<_, Permission>(
        "UPDATE permissions SET name = $1, description = $2, updated_at = NOW()
         WHERE id = $3
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(&name)
    .bind(&description)
    .bind(id)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::bad_request(anyhow!("Permission already exists"));
            }
        }
        AppError::from(e)
    })
}

#[instrument(skip(db))]
pub async fn delete_permission(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Permission not found")));
    }

    Ok(())
}

// ============ Role Services ============

#[instrument(skip(db))]
pub async fn create_role(
    db: &PgPool,
    name: &str,
    description: &str,
    permission_names: &[String],
) -> Result<RoleWithPermissions, AppError> {
    // Resolve every permission name up front so a role is never persisted
    // with dangling references.
    let mut permissions = Vec::with_capacity(permission_names.len());
    for perm_name in permission_names {
        let permission = get_permission_by_name(db, perm_name)
            .await?
            .ok_or_else(|| {
                AppError::bad_request(anyhow!("Permission {} does not exist", perm_name))
            })?;
        permissions.push(permission);
    }

    let role = sqlx::query_as::<_, Role>(
        "INSERT INTO roles (name, description)
         VALUES ($1, $2)
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(name)
    .bind(description)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::bad_request(anyhow!("Role already exists"));
            }
        }
        AppError::from(e)
    })?;

    for permission in &permissions {
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id)
             VALUES ($1, $2)
             ON CONFLICT (role_id, permission_id) DO NOTHING",
        )
        .bind(role.id)
        .bind(permission.id)
        .execute(db)
        .await?;
    }

    Ok(RoleWithPermissions { role, permissions })
}

/// Race-tolerant variant used by signup provisioning: losing the creation
/// race is recovered by reading whoever won.
#[instrument(skip(db))]
pub async fn get_or_create_role(
    db: &PgPool,
    name: &str,
    description: &str,
    permission_names: &[String],
) -> Result<RoleWithPermissions, AppError> {
    if let Some(existing) = get_role_by_name(db, name).await? {
        return Ok(existing);
    }

    match create_role(db, name, description, permission_names).await {
        Ok(role) => Ok(role),
        Err(_) => get_role_by_name(db, name)
            .await?
            .ok_or_else(|| AppError::internal(anyhow!("Role {} vanished during upsert", name))),
    }
}

#[instrument(skip(db))]
pub async fn get_role_by_id(db: &PgPool, id: Uuid) -> Result<RoleWithPermissions, AppError> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT id, name, description, created_at, updated_at FROM roles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))?;

    let permissions = get_role_permissions(db, role.id).await?;

    Ok(RoleWithPermissions { role, permissions })
}

#[instrument(skip(db))]
pub async fn get_role_by_name(
    db: &PgPool,
    name: &str,
) -> Result<Option<RoleWithPermissions>, AppError> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT id, name, description, created_at, updated_at FROM roles WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(db)
    .await?;

    match role {
        Some(role) => {
            let permissions = get_role_permissions(db, role.id).await?;
            Ok(Some(RoleWithPermissions { role, permissions }))
        }
        None => Ok(None),
    }
}

#[instrument(skip(db))]
pub async fn get_all_roles(db: &PgPool) -> Result<Vec<RoleWithPermissions>, AppError> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT id, name, description, created_at, updated_at FROM roles ORDER BY name",
    )
    .fetch_all(db)
    .await?;

    let mut roles_with_permissions = Vec::new();
    for role in roles {
        let permissions = get_role_permissions(db, role.id).await?;
        roles_with_permissions.push(RoleWithPermissions { role, permissions });
    }

    Ok(roles_with_permissions)
}

#[instrument(skip(db))]
pub async fn update_role(
    db: &PgPool,
    id: Uuid,
    dto: UpdateRoleDto,
) -> Result<RoleWithPermissions, AppError> {
    let existing = get_role_by_id(db, id).await?;

    // Additional permissions only ever grow the set
    if let Some(permission_names) = &dto.permissions {
        for perm_name in permission_names {
            let permission = get_permission_by_name(db, perm_name)
                .await?
                .ok_or_else(|| {
                    AppError::bad_request(anyhow!("Permission {} does not exist", perm_name))
                })?;

            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_id)
                 VALUES ($1, $2)
                 ON CONFLICT (role_id, permission_id) DO NOTHING",
            )
            .bind(id)
            .bind(permission.id)
            .execute(db)
            .await?;
        }
    }

    let name = dto.name.unwrap_or(existing.role.name);
    let description = dto.description.unwrap_or(existing.role.description);

    let role = sqlx::query_as::<_, Role>(
        "UPDATE roles SET name = $1, description = $2, updated_at = NOW()
         WHERE id = $3
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(&name)
    .bind(&description)
    .bind(id)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::bad_request(anyhow!("Role already exists"));
            }
        }
        AppError::from(e)
    })?;

    let permissions = get_role_permissions(db, role.id).await?;

    Ok(RoleWithPermissions { role, permissions })
}

#[instrument(skip(db))]
pub async fn delete_role(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Role not found")));
    }

    Ok(())
}

#[instrument(skip(db))]
pub async fn get_role_permissions(db: &PgPool, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.name, p.description, p.created_at, p.updated_at
         FROM permissions p
         INNER JOIN role_permissions rp ON p.id = rp.permission_id
         WHERE rp.role_id = $1
         ORDER BY p.name",
    )
    .bind(role_id)
    .fetch_all(db)
    .await?;

    Ok(permissions)
}

// ============ User Role Assignment ============

/// Idempotent: assigning a role the user already holds changes nothing.
#[instrument(skip(db))]
pub async fn assign_role_to_user(
    db: &PgPool,
    user_id: Uuid,
    role_name: &str,
) -> Result<(), AppError> {
    let role = get_role_by_name(db, role_name)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id, position)
         VALUES ($1, $2,
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM user_roles WHERE user_id = $1))
         ON CONFLICT (user_id, role_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(role.role.id)
    .execute(db)
    .await?;

    Ok(())
}

/// Roles come back in assignment order.
#[instrument(skip(db))]
pub async fn get_user_roles(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<RoleWithPermissions>, AppError> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.description, r.created_at, r.updated_at
         FROM roles r
         INNER JOIN user_roles ur ON r.id = ur.role_id
         WHERE ur.user_id = $1
         ORDER BY ur.position",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut roles_with_permissions = Vec::new();
    for role in roles {
        let permissions = get_role_permissions(db, role.id).await?;
        roles_with_permissions.push(RoleWithPermissions { role, permissions });
    }

    Ok(roles_with_permissions)
}

// ============ Permission Check ============

/// True iff any one of the user's roles grants the named permission. The
/// check is a two-phase read: load the user's role references, then resolve
/// the permissions of that role set.
#[instrument(skip(db))]
pub async fn check_permission(
    db: &PgPool,
    user_id: Uuid,
    permission_name: &str,
) -> Result<bool, AppError> {
    let role_ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY position")
            .bind(user_id)
            .fetch_all(db)
            .await?;

    if role_ids.is_empty() {
        return Ok(false);
    }

    let granted: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM role_permissions rp
            INNER JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1) AND p.name = $2
        )",
    )
    .bind(&role_ids)
    .bind(permission_name)
    .fetch_one(db)
    .await?;

    Ok(granted)
}
