use anyhow::anyhow;
use axum::{
    Form, Json,
    extract::State,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserWithRoles;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{create_access_token, create_refresh_token, verify_refresh_token};

use super::model::{LoginForm, LogoutRequest, MessageResponse, TokenPair};
use super::service::AuthService;

/// Access creation and token refresh
#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, description = "Wrong password or email")
    ),
    tag = "Auth"
)]
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenPair>, AppError> {
    let tokens = AuthService::login(&state.db, &form.username, &form.password, &state.jwt_config)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow!("Wrong password or Email.")))?;

    Ok(Json(tokens))
}

/// Verify that the bearer token is still valid
#[utoipa::path(
    post,
    path = "/api/auth/test-token",
    responses(
        (status = 200, description = "Authenticated user", body = UserWithRoles),
        (status = 401, description = "Invalid or revoked token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[instrument(skip(state, auth_user))]
pub async fn test_token(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserWithRoles>, AppError> {
    let user = UserService::get_user_with_roles(&state.db, auth_user.user_id()?).await?;
    Ok(Json(user))
}

/// Exchange a refresh token for a fresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = String,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 403, description = "Invalid token"),
        (status = 404, description = "Token subject no longer exists")
    ),
    tag = "Auth"
)]
#[instrument(skip(state, refresh_token))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(refresh_token): Json<String>,
) -> Result<Json<TokenPair>, AppError> {
    let claims = verify_refresh_token(&refresh_token, &state.jwt_config)
        .map_err(|_| AppError::forbidden(anyhow!("Invalid Token")))?;

    AuthService::ensure_not_blacklisted(&state.db, &refresh_token).await?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::forbidden(anyhow!("Invalid Token")))?;

    let user = UserService::get_user_by_id(&state.db, user_id)
        .await
        .map_err(|_| AppError::not_found(anyhow!("Invalid token for user.")))?;

    Ok(Json(TokenPair {
        access_token: create_access_token(user.id, &state.jwt_config)?,
        refresh_token: create_refresh_token(user.id, &state.jwt_config)?,
    }))
}

/// Logout: revoke the session's tokens ahead of their natural expiry
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logout confirmation", body = MessageResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[instrument(skip(state, _auth_user, body))]
pub async fn logout(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(body): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(&state.db, &body.access_token, body.refresh_token.as_deref()).await?;

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}
