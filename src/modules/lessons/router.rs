use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::lessons::controller::{
    create_lesson, delete_lesson, get_all_lessons, get_lesson, update_lesson,
};
use crate::state::AppState;

pub fn init_lessons_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lesson).get(get_all_lessons))
        .route(
            "/{lesson_id}",
            get(get_lesson).put(update_lesson).delete(delete_lesson),
        )
}
