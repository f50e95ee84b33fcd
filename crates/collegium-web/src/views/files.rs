use std::fmt::Write as _;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use collegium_core::StoredFile;
use serde::Deserialize;
use uuid::Uuid;

use super::layout::{esc, page, url_encode, Section};
use super::{error_flash, flashes, load_colleges, not_found};
use crate::download::{attachment, BINARY_CONTENT_TYPE};
use crate::session::ViewUser;
use crate::state::{AppState, FlashKind};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/files", get(files_page))
        .route(
            "/files/{id}",
            axum::routing::post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/files/{id}/{filename}", get(download))
}

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub college: Option<Uuid>,
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

fn file_rows(college: Uuid, files: &[StoredFile]) -> String {
    if files.is_empty() {
        return r#"<p class="muted">No files uploaded for this college.</p>"#.to_string();
    }

    let mut rows = String::new();
    for file in files {
        let modified = file
            .modified_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let _ = write!(
            rows,
            r#"<tr><td>{name}</td><td>{size}</td><td>{modified}</td><td><a class="button" href="/files/{college}/{href}">Download</a></td></tr>"#,
            name = esc(&file.name),
            size = human_size(file.size),
            href = url_encode(&file.name),
        );
    }
    format!(
        "<h2>Available files</h2><table><thead><tr><th>File</th><th>Size</th><th>Modified</th><th></th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

async fn files_page(
    State(state): State<AppState>,
    user: ViewUser,
    Query(query): Query<FilesQuery>,
) -> impl IntoResponse {
    let (colleges, mut error) = load_colleges(&state).await;

    let body = if colleges.is_empty() {
        r#"<p class="warning">Please add a college first.</p>"#.to_string()
    } else {
        let selected = query
            .college
            .filter(|id| colleges.iter().any(|c| c.id == *id))
            .unwrap_or(colleges[0].id);

        let mut options = String::new();
        for college in &colleges {
            let marker = if college.id == selected { " selected" } else { "" };
            let _ = write!(
                options,
                r#"<option value="{}"{marker}>{}</option>"#,
                college.id,
                esc(college.name())
            );
        }

        let files = match state.files.list(selected).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, college = %selected, "Failed to list files");
                error = Some(error_flash(format!("Could not read files: {e}")));
                Vec::new()
            }
        };

        format!(
            r#"<form method="get" action="/files" class="card inline-form no-print">
  <label>College <select name="college">{options}</select></label>
  <button type="submit">Show</button>
</form>
<form method="post" action="/files/{selected}" enctype="multipart/form-data" class="card inline-form no-print">
  <label>Upload a file <input type="file" name="file" required></label>
  <button type="submit">Upload</button>
</form>
{rows}"#,
            rows = file_rows(selected, &files),
        )
    };

    let flashes = flashes(&state, &user, error).await;
    page("Files", Section::Files, &user.username, &flashes, &body)
}

async fn upload(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    match state.colleges.get(id).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            state.flash(user.session_id, FlashKind::Error, e.to_string()).await;
            return Redirect::to("/files").into_response();
        }
    }

    let mut saved = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                let text = format!("Upload failed: {e}");
                state.flash(user.session_id, FlashKind::Error, text).await;
                return Redirect::to(&format!("/files?college={id}")).into_response();
            }
        };

        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        if filename.is_empty() {
            continue;
        }

        let result = match field.bytes().await {
            Ok(bytes) => state.files.save(id, &filename, &bytes).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, %id, filename = %filename, "Upload rejected");
            let text = format!("Could not save {filename}: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
            return Redirect::to(&format!("/files?college={id}")).into_response();
        }
        saved.push(filename);
    }

    if saved.is_empty() {
        state.flash(user.session_id, FlashKind::Error, "Choose a file to upload").await;
    } else {
        let text = format!("Uploaded {}", saved.join(", "));
        state.flash(user.session_id, FlashKind::Success, text).await;
    }
    Redirect::to(&format!("/files?college={id}")).into_response()
}

async fn download(
    State(state): State<AppState>,
    user: ViewUser,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Response {
    match state.files.fetch(id, &filename).await {
        Ok(bytes) => attachment(&filename, BINARY_CONTENT_TYPE, bytes),
        Err(e) if e.is_not_found() => not_found(&user, &filename),
        Err(e) => {
            tracing::warn!(error = %e, %id, filename = %filename, "Download failed");
            let text = format!("Could not read {filename}: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
            Redirect::to(&format!("/files?college={id}")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::human_size;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
