use std::fmt::Write as _;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::CookieJar;
use collegium_core::StudentCategory;
use serde::Deserialize;

use super::layout::{bare_page, esc, group_digits, page, Section};
use super::{error_flash, flashes, load_colleges};
use crate::session::{session_cookie, SessionToken, ViewUser};
use crate::state::{AppState, Flash, FlashKind};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn login_page(flashes: &[Flash], username: &str) -> axum::response::Html<String> {
    let body = format!(
        r#"<form method="post" action="/login" class="card login">
  <label>Username <input name="username" value="{}" autocomplete="username" required autofocus></label>
  <label>Password <input name="password" type="password" autocomplete="current-password" required></label>
  <button type="submit">Log in</button>
</form>"#,
        esc(username)
    );
    bare_page("Log in", flashes, &body)
}

async fn login_form(State(state): State<AppState>, SessionToken(token): SessionToken) -> Response {
    let Some(session_id) = token else {
        return login_page(&[], "").into_response();
    };

    let mut sessions = state.sessions.write().await;
    if sessions.authenticated_user(session_id).is_some() {
        return Redirect::to("/").into_response();
    }
    let pending: Vec<Flash> = sessions.take_flash(session_id).into_iter().collect();
    login_page(&pending, "").into_response()
}

async fn login(
    State(state): State<AppState>,
    SessionToken(previous): SessionToken,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let denied = match state.credentials.login(&form.username, &form.password).await {
        Ok(true) => None,
        Ok(false) => Some(error_flash("Incorrect username or password")),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read credentials");
            Some(error_flash(format!("Could not verify credentials: {e}")))
        }
    };

    if let Some(flash) = denied {
        let page = login_page(std::slice::from_ref(&flash), &form.username);
        return (StatusCode::UNAUTHORIZED, page).into_response();
    }

    let session_id = {
        let mut sessions = state.sessions.write().await;
        if let Some(previous) = previous {
            sessions.remove(previous);
        }
        let id = sessions.login(form.username.clone());
        sessions.set_flash(id, FlashKind::Success, "Logged in successfully");
        tracing::debug!(active = sessions.len(), "Session started");
        id
    };

    (jar.add(session_cookie(session_id)), Redirect::to("/")).into_response()
}

async fn logout(State(state): State<AppState>, user: ViewUser) -> Redirect {
    let mut sessions = state.sessions.write().await;
    sessions.logout(user.session_id);
    sessions.set_flash(user.session_id, FlashKind::Success, "Logged out");
    tracing::info!(username = %user.username, "Logged out");
    Redirect::to("/login")
}

async fn home(State(state): State<AppState>, user: ViewUser) -> impl IntoResponse {
    let (colleges, error) = load_colleges(&state).await;
    let totals = collegium_core::Totals::from_colleges(&colleges);

    let mut cards = String::new();
    for category in [StudentCategory::Total, StudentCategory::Foreign, StudentCategory::Graduate] {
        let _ = write!(
            cards,
            r#"<div class="stat-card"><h4>{}</h4><p>{}</p></div>"#,
            category.label(),
            group_digits(totals.get(category))
        );
    }

    let body = format!(
        r#"<section class="welcome">
  <h2>Welcome to the college management system</h2>
  <p>{} colleges with {} departments are on record. Pick a section from the menu to get started.</p>
</section>
<div class="student-stats">{cards}</div>
<p class="actions"><a class="button" href="/colleges/new">Add a college</a> <a class="button" href="/stats">Open statistics</a></p>"#,
        totals.colleges, totals.departments,
    );

    let flashes = flashes(&state, &user, error).await;
    page("Home", Section::Home, &user.username, &flashes, &body)
}
