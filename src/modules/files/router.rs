use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::files::controller::{create_file, delete_file, get_all_files, get_file};
use crate::state::AppState;

pub fn init_files_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_file).get(get_all_files))
        .route("/{file_id}", get(get_file).delete(delete_file))
}
