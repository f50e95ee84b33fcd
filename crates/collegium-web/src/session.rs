use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};

use crate::state::{AppState, SessionId};

pub const SESSION_COOKIE_NAME: &str = "collegium_session";

/// Extractor that provides the session ID from cookies, if one was sent
pub struct SessionToken(pub Option<SessionId>);

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read cookies"))?;

        let session_id = jar
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| cookie.value().parse::<SessionId>().ok());

        Ok(Self(session_id))
    }
}

/// Logged-in user behind an HTML route; anonymous requests go to `/login`
pub struct ViewUser {
    pub session_id: SessionId,
    pub username: String,
}

/// Logged-in user behind an API route; anonymous requests get `401`
pub struct ApiUser {
    pub session_id: SessionId,
    pub username: String,
}

async fn authenticated(parts: &mut Parts, state: &AppState) -> Option<(SessionId, String)> {
    let SessionToken(session_id) = SessionToken::from_request_parts(parts, state).await.ok()?;
    let session_id = session_id?;
    let username = state.sessions.write().await.authenticated_user(session_id)?;
    Some((session_id, username))
}

impl FromRequestParts<AppState> for ViewUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticated(parts, state).await {
            Some((session_id, username)) => Ok(Self { session_id, username }),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}

impl FromRequestParts<AppState> for ApiUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticated(parts, state).await {
            Some((session_id, username)) => Ok(Self { session_id, username }),
            None => Err((StatusCode::UNAUTHORIZED, "Login required")),
        }
    }
}

/// Cookie to set on response after login
pub fn session_cookie(session_id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}
