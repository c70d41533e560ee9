use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub algorithm: Algorithm,
    pub access_expire_minutes: i64,
    pub refresh_expire_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            access_secret: env::var("JWT_SECRET_KEY")
                .unwrap_or_else(|_| "access-secret-change-in-production".to_string()),
            refresh_secret: env::var("JWT_REFRESH_SECRET_KEY")
                .unwrap_or_else(|_| "refresh-secret-change-in-production".to_string()),
            algorithm: env::var("JWT_ALGORITHM")
                .ok()
                .and_then(|s| Algorithm::from_str(&s).ok())
                .unwrap_or(Algorithm::HS256),
            // TODO: tighten the 999 minute default once the frontend refresh
            // flow stops depending on long-lived access tokens
            access_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(999),
            refresh_expire_minutes: env::var("REFRESH_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60 * 24 * 7), // 7 days
        }
    }
}
