use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::modules::roles::service as roles_service;
use crate::utils::errors::AppError;
use crate::utils::password::{hash_password, is_bcrypt_hash, verify_password};

use super::model::{CreateUserDto, UpdateUserDto, User, UserWithRoles};

/// Capabilities every account is provisioned with at signup.
pub const BASELINE_PERMISSIONS: [&str; 4] = ["create", "edit", "read", "delete"];

pub const ADMIN_ROLE: &str = "Administrator";
pub const DEFAULT_ROLE: &str = "User";

const USER_COLUMNS: &str = "id, username, email, hashed_password, active, profile_picture, bio, \
     location, website, phone_number, verified, is_teacher, is_student, last_login, created_at, \
     updated_at";

pub struct UserService;

impl UserService {
    /// Create a user and provision its default role.
    ///
    /// Shared permissions and the default role are created on first use;
    /// concurrent signups racing on those rows recover by re-reading
    /// whichever creation won.
    #[instrument(skip(db, dto))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<UserWithRoles, AppError> {
        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&dto.username)
                .fetch_one(db)
                .await?;
        if username_taken {
            return Err(AppError::bad_request(anyhow!("Username already exists")));
        }

        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&dto.email)
                .fetch_one(db)
                .await?;
        if email_taken {
            return Err(AppError::bad_request(anyhow!("Email already exists")));
        }

        let hashed_password = hash_password(&dto.password)?;

        let mut baseline = Vec::with_capacity(BASELINE_PERMISSIONS.len());
        for name in BASELINE_PERMISSIONS {
            let permission = roles_service::get_or_create_permission(
                db,
                name,
                &format!("Permission to {}", name),
            )
            .await?;
            baseline.push(permission.name);
        }

        let (role_name, role_description) = if dto.is_admin {
            (ADMIN_ROLE, "Full access role")
        } else {
            (DEFAULT_ROLE, "Default role for platform users")
        };
        let role =
            roles_service::get_or_create_role(db, role_name, role_description, &baseline).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, hashed_password, active)
             VALUES ($1, $2, $3, TRUE)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&hashed_password)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!("Username or email already exists"));
                }
            }
            AppError::from(e)
        })?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id, position) VALUES ($1, $2, 0)
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user.id)
        .bind(role.role.id)
        .execute(db)
        .await?;

        Ok(UserWithRoles {
            user,
            roles: vec![role],
        })
    }

    /// Credential check. Deliberately collapses every failure mode into
    /// `None` so callers cannot tell which half of the pair was wrong; the
    /// concrete reason only goes to the log.
    #[instrument(skip(db, password))]
    pub async fn authenticate(
        db: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let user = match Self::get_user_by_email(db, email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("No user found with email: {}", email);
                return Ok(None);
            }
            Err(e) => {
                error!("Authentication error for {}: {}", email, e.error);
                return Ok(None);
            }
        };

        if user.hashed_password.is_empty() {
            error!("User {} has no hashed password stored", email);
            return Ok(None);
        }

        if !is_bcrypt_hash(&user.hashed_password) {
            error!("Invalid hash format for user {}", email);
            return Ok(None);
        }

        if !verify_password(password, &user.hashed_password) {
            warn!("Invalid password attempt for user: {}", email);
            return Ok(None);
        }

        Ok(Some(user))
    }

    #[instrument(skip(db))]
    pub async fn get_all_users(db: &PgPool) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
                .fetch_all(db)
                .await?;

        if users.is_empty() {
            return Err(AppError::not_found(anyhow!("No users found")));
        }

        Ok(users)
    }

    #[instrument(skip(db))]
    pub async fn get_user_by_id(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    /// Two-phase read: the user row, then its role references resolved.
    #[instrument(skip(db))]
    pub async fn get_user_with_roles(db: &PgPool, id: Uuid) -> Result<UserWithRoles, AppError> {
        let user = Self::get_user_by_id(db, id).await?;
        let roles = roles_service::get_user_roles(db, user.id).await?;

        Ok(UserWithRoles { user, roles })
    }

    #[instrument(skip(db))]
    pub async fn get_user_by_username(
        db: &PgPool,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(db)
                .await?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_user_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(db)
                .await?;

        Ok(user)
    }

    /// Partial update: only supplied fields change.
    #[instrument(skip(db, dto))]
    pub async fn update_user_by_id(
        db: &PgPool,
        id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user_by_id(db, id).await?;

        let hashed_password = match dto.password {
            Some(ref password) => hash_password(password)?,
            None => existing.hashed_password,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                 username = $1, email = $2, hashed_password = $3, active = $4,
                 profile_picture = $5, bio = $6, location = $7, website = $8,
                 phone_number = $9, is_teacher = $10, is_student = $11, updated_at = NOW()
             WHERE id = $12
             RETURNING {USER_COLUMNS}"
        ))
        .bind(dto.username.unwrap_or(existing.username))
        .bind(dto.email.unwrap_or(existing.email))
        .bind(&hashed_password)
        .bind(dto.active.unwrap_or(existing.active))
        .bind(dto.profile_picture.unwrap_or(existing.profile_picture))
        .bind(dto.bio.unwrap_or(existing.bio))
        .bind(dto.location.unwrap_or(existing.location))
        .bind(dto.website.unwrap_or(existing.website))
        .bind(dto.phone_number.unwrap_or(existing.phone_number))
        .bind(dto.is_teacher.unwrap_or(existing.is_teacher))
        .bind(dto.is_student.unwrap_or(existing.is_student))
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!("Username or email already exists"));
                }
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn delete_user_by_id(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn record_login(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }
}
