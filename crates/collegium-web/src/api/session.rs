use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::session::{session_cookie, ApiUser, SessionToken};
use crate::state::{AppState, SessionId};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub username: String,
    pub authenticated: bool,
}

async fn get_session(user: ApiUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        session_id: user.session_id,
        username: user.username,
        authenticated: true,
    })
}

async fn login(
    State(state): State<AppState>,
    SessionToken(previous): SessionToken,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let ok = state
        .credentials
        .login(&req.username, &req.password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read credentials");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Could not verify credentials: {e}"))
        })?;

    if !ok {
        return Err((StatusCode::UNAUTHORIZED, "Incorrect username or password".to_string()));
    }

    let session_id = {
        let mut sessions = state.sessions.write().await;
        if let Some(previous) = previous {
            sessions.remove(previous);
        }
        sessions.login(req.username.clone())
    };

    let response = SessionResponse {
        session_id,
        username: req.username,
        authenticated: true,
    };

    Ok((jar.add(session_cookie(session_id)), Json(response)))
}

async fn logout(State(state): State<AppState>, user: ApiUser) -> StatusCode {
    state.sessions.write().await.logout(user.session_id);
    StatusCode::NO_CONTENT
}
