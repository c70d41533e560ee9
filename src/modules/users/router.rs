use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::users::controller::{
    create_user, delete_user, get_me, get_user, get_users, update_user,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(get_users))
        .route("/me", get(get_me))
        .route(
            "/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}
