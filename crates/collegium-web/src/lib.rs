#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::option_if_let_else)]

mod api;
pub mod config;
mod download;
pub mod session;
pub mod state;
mod views;

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use config::ServerConfig;
pub use state::AppState;

/// Full application router: HTML views at the root, JSON under `/api`,
/// stylesheet and other assets under `/static`.
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        .merge(views::router(max_upload_bytes))
        .nest("/api", api::router(max_upload_bytes))
        .nest_service("/static", static_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
