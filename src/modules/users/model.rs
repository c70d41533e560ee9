use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::roles::model::RoleWithPermissions;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub hashed_password: String,
    pub active: bool,
    pub profile_picture: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub phone_number: String,
    pub verified: bool,
    pub is_teacher: bool,
    pub is_student: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User plus its role references resolved to full role documents.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserWithRoles {
    pub user: User,
    pub roles: Vec<RoleWithPermissions>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 3))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8))]
    pub password: Option<String>,
    pub active: Option<bool>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub is_teacher: Option<bool>,
    pub is_student: Option<bool>,
}
