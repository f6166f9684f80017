use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::features::files::handlers::{
    delete_file, get_file_data, list_files, list_my_files, upload_file,
};
use crate::features::files::state::FilesState;
use crate::shared::constants::MULTIPART_OVERHEAD;

/// Create routes for the files feature, relative to the `/file` prefix
pub fn routes(state: FilesState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/files/", get(list_files))
        .route("/my/files/", get(list_my_files))
        .route("/data/{file_name}/", get(get_file_data))
        .route(
            "/upload/",
            // multipart framing needs headroom over the file size itself
            post(upload_file).layer(DefaultBodyLimit::max(
                max_upload_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/delete/{file_id}/", delete(delete_file))
        .with_state(state)
}
