mod colleges;
mod files;
mod session;
mod stats;

use axum::{http::StatusCode, Router};

use crate::state::AppState;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/colleges", colleges::router())
        .nest("/files", files::router(max_upload_bytes))
        .nest("/session", session::router())
        .nest("/stats", stats::router())
}

/// Map a core error onto the status code the API reports for it.
fn error_response(e: &collegium_core::Error) -> (StatusCode, String) {
    let status = match e {
        collegium_core::Error::CollegeNotFound(_) | collegium_core::Error::FileNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        collegium_core::Error::InvalidFilename(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
