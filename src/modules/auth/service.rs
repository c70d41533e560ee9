use anyhow::anyhow;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::config::jwt::JwtConfig;
use crate::modules::users::service::UserService;
use crate::utils::errors::AppError;
use crate::utils::jwt::{create_access_token, create_refresh_token};

use super::model::TokenPair;

/// How long blacklist entries stay effective. Decoupled from the tokens'
/// embedded expiries to bound blacklist growth.
const ACCESS_BLACKLIST_DAYS: i64 = 1;
const REFRESH_BLACKLIST_DAYS: i64 = 7;

pub struct AuthService;

impl AuthService {
    /// Exchange credentials for a token pair. `None` means the pair was
    /// wrong in some way the caller is not told about.
    #[instrument(skip(db, password, jwt_config))]
    pub async fn login(
        db: &PgPool,
        email: &str,
        password: &str,
        jwt_config: &JwtConfig,
    ) -> Result<Option<TokenPair>, AppError> {
        let Some(user) = UserService::authenticate(db, email, password).await? else {
            return Ok(None);
        };

        UserService::record_login(db, user.id).await?;

        Ok(Some(TokenPair {
            access_token: create_access_token(user.id, jwt_config)?,
            refresh_token: create_refresh_token(user.id, jwt_config)?,
        }))
    }

    /// Reject tokens that were revoked and whose blacklist horizon has not
    /// yet passed, regardless of the expiry embedded in the token itself.
    #[instrument(skip(db, token))]
    pub async fn ensure_not_blacklisted(db: &PgPool, token: &str) -> Result<(), AppError> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM blacklisted_tokens WHERE token = $1 AND expires_at > NOW()
            )",
        )
        .bind(token)
        .fetch_one(db)
        .await?;

        if revoked {
            return Err(AppError::unauthorized(anyhow!("Token has been revoked")));
        }

        Ok(())
    }

    /// Blacklist the session's tokens. Each entry carries its own horizon:
    /// +1 day for the access token, +7 days for the refresh token.
    #[instrument(skip(db, access_token, refresh_token))]
    pub async fn logout(
        db: &PgPool,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO blacklisted_tokens (token, expires_at) VALUES ($1, $2)")
            .bind(access_token)
            .bind(Utc::now() + Duration::days(ACCESS_BLACKLIST_DAYS))
            .execute(db)
            .await?;

        if let Some(refresh_token) = refresh_token {
            sqlx::query("INSERT INTO blacklisted_tokens (token, expires_at) VALUES ($1, $2)")
                .bind(refresh_token)
                .bind(Utc::now() + Duration::days(REFRESH_BLACKLIST_DAYS))
                .execute(db)
                .await?;
        }

        Ok(())
    }
}
