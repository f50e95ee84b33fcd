//! Server-rendered HTML pages.

mod auth;
mod colleges;
mod files;
pub mod layout;
mod stats;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use collegium_core::College;

use crate::session::ViewUser;
use crate::state::{AppState, Flash, FlashKind};
use layout::{esc, page, Section};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(colleges::router())
        .merge(files::router(max_upload_bytes))
        .merge(stats::router())
}

/// Pending flash for this session followed by `extra`.
async fn flashes(state: &AppState, user: &ViewUser, extra: Option<Flash>) -> Vec<Flash> {
    let pending = state.sessions.write().await.take_flash(user.session_id);
    pending.into_iter().chain(extra).collect()
}

fn error_flash(text: impl Into<String>) -> Flash {
    Flash {
        kind: FlashKind::Error,
        text: text.into(),
    }
}

/// College list for rendering; an unreadable catalog shows as empty plus
/// an error banner instead of failing the page.
async fn load_colleges(state: &AppState) -> (Vec<College>, Option<Flash>) {
    match state.colleges.list().await {
        Ok(colleges) => (colleges, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read colleges");
            (Vec::new(), Some(error_flash(format!("Could not read college data: {e}"))))
        }
    }
}

fn not_found(user: &ViewUser, what: &str) -> Response {
    let body = format!(
        r#"<p>{} was not found. It may have been deleted.</p><p><a href="/colleges">Back to colleges</a></p>"#,
        esc(what)
    );
    (
        StatusCode::NOT_FOUND,
        page("Not found", Section::Colleges, &user.username, &[], &body),
    )
        .into_response()
}
