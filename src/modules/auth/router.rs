use axum::{Router, routing::post};

use crate::modules::auth::controller::{login, logout, refresh_token, test_token};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/test-token", post(test_token))
}
