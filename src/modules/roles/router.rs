use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::roles::controller::{
    assign_role, create_permission, create_role, delete_permission, delete_role,
    get_all_permissions, get_all_roles, get_permission_by_id, get_role_by_id, update_permission,
    update_role,
};
use crate::state::AppState;

pub fn init_roles_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_role).get(get_all_roles))
        .route(
            "/{role_id}",
            get(get_role_by_id).put(update_role).delete(delete_role),
        )
        .route("/users/{user_id}/roles", post(assign_role))
}

pub fn init_permissions_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_permission).get(get_all_permissions))
        .route(
            "/{permission_id}",
            get(get_permission_by_id)
                .put(update_permission)
                .delete(delete_permission),
        )
}
