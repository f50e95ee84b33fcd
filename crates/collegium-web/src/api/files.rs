use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use collegium_core::StoredFile;
use uuid::Uuid;

use super::error_response;
use crate::download::{attachment, BINARY_CONTENT_TYPE};
use crate::session::ApiUser;
use crate::state::AppState;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(list_files)
                .post(upload_files)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/{id}/{filename}", get(download_file))
}

async fn list_files(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StoredFile>>, (StatusCode, String)> {
    let files = state.files.list(id).await.map_err(|e| error_response(&e))?;
    Ok(Json(files))
}

/// Store every file part of the multipart body; returns the updated listing.
async fn upload_files(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<StoredFile>>), (StatusCode, String)> {
    state.colleges.get(id).await.map_err(|e| error_response(&e))?;

    let mut stored = 0;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        state
            .files
            .save(id, &filename, &bytes)
            .await
            .map_err(|e| error_response(&e))?;
        stored += 1;
    }

    if stored == 0 {
        return Err((StatusCode::BAD_REQUEST, "No file part in request".to_string()));
    }

    let files = state.files.list(id).await.map_err(|e| error_response(&e))?;
    Ok((StatusCode::CREATED, Json(files)))
}

async fn download_file(
    State(state): State<AppState>,
    _user: ApiUser,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Result<Response, (StatusCode, String)> {
    let bytes = state
        .files
        .fetch(id, &filename)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(attachment(&filename, BINARY_CONTENT_TYPE, bytes))
}
