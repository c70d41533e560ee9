use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::courses::controller::{
    create_course, delete_course, enroll, get_all_courses, get_course, update_course,
};
use crate::state::AppState;

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(get_all_courses))
        .route(
            "/{course_id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{course_id}/enroll", post(enroll))
}
