use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::Claims;
use crate::utils::errors::AppError;

fn create_token(user_id: Uuid, secret: &str, expire_minutes: i64, config: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + (expire_minutes * 60) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

pub fn create_access_token(user_id: Uuid, config: &JwtConfig) -> Result<String, AppError> {
    create_token(user_id, &config.access_secret, config.access_expire_minutes, config)
}

pub fn create_refresh_token(user_id: Uuid, config: &JwtConfig) -> Result<String, AppError> {
    create_token(user_id, &config.refresh_secret, config.refresh_expire_minutes, config)
}

fn decode_token(token: &str, secret: &str, config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(config.algorithm),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid Token")))
}

pub fn verify_access_token(token: &str, config: &JwtConfig) -> Result<Claims, AppError> {
    decode_token(token, &config.access_secret, config)
}

pub fn verify_refresh_token(token: &str, config: &JwtConfig) -> Result<Claims, AppError> {
    decode_token(token, &config.refresh_secret, config)
}
