use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use collegium_core::{College, CollegeFields};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error_response;
use crate::session::ApiUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_colleges).post(create_college))
        .route("/by-name", axum::routing::delete(delete_by_name))
        .route("/{id}", get(get_college).put(update_college).delete(delete_college))
        .route(
            "/{id}/departments/{name}",
            post(add_department).delete(remove_department),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateCollegeRequest {
    #[serde(flatten)]
    pub fields: CollegeFields,
    #[serde(default)]
    pub departments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCollegeRequest {
    #[serde(flatten)]
    pub fields: CollegeFields,
    /// Replaces the department list when present
    pub departments: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub removed: usize,
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentChange {
    pub changed: bool,
    pub departments: Vec<String>,
}

async fn list_colleges(
    State(state): State<AppState>,
    _user: ApiUser,
) -> Result<Json<Vec<College>>, (StatusCode, String)> {
    let colleges = state.colleges.list().await.map_err(|e| error_response(&e))?;
    Ok(Json(colleges))
}

async fn get_college(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<Uuid>,
) -> Result<Json<College>, (StatusCode, String)> {
    let college = state.colleges.get(id).await.map_err(|e| error_response(&e))?;
    Ok(Json(college))
}

async fn create_college(
    State(state): State<AppState>,
    _user: ApiUser,
    Json(req): Json<CreateCollegeRequest>,
) -> Result<(StatusCode, Json<College>), (StatusCode, String)> {
    let college = state
        .colleges
        .add(req.fields, req.departments)
        .await
        .map_err(|e| error_response(&e))?;
    Ok((StatusCode::CREATED, Json(college)))
}

async fn update_college(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCollegeRequest>,
) -> Result<Json<College>, (StatusCode, String)> {
    let college = state
        .colleges
        .update(id, req.fields, req.departments)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(college))
}

async fn delete_college(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.colleges.delete(id).await.map_err(|e| error_response(&e))?;
    if let Err(e) = state.files.remove_college(id).await {
        tracing::warn!(error = %e, %id, "Failed to remove college files");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_by_name(
    State(state): State<AppState>,
    _user: ApiUser,
    Query(query): Query<NameQuery>,
) -> Result<Json<DeletedResponse>, (StatusCode, String)> {
    let ids = state
        .colleges
        .delete_by_name(&query.name)
        .await
        .map_err(|e| error_response(&e))?;
    for id in &ids {
        if let Err(e) = state.files.remove_college(*id).await {
            tracing::warn!(error = %e, %id, "Failed to remove college files");
        }
    }
    Ok(Json(DeletedResponse {
        removed: ids.len(),
        ids,
    }))
}

async fn add_department(
    State(state): State<AppState>,
    _user: ApiUser,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<DepartmentChange>, (StatusCode, String)> {
    let name = name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Department name is required".to_string()));
    }

    let changed = state
        .colleges
        .add_department(id, name)
        .await
        .map_err(|e| error_response(&e))?;
    department_change(&state, id, changed).await
}

async fn remove_department(
    State(state): State<AppState>,
    _user: ApiUser,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<DepartmentChange>, (StatusCode, String)> {
    let changed = state
        .colleges
        .remove_department(id, &name)
        .await
        .map_err(|e| error_response(&e))?;
    department_change(&state, id, changed).await
}

async fn department_change(
    state: &AppState,
    id: Uuid,
    changed: bool,
) -> Result<Json<DepartmentChange>, (StatusCode, String)> {
    let college = state.colleges.get(id).await.map_err(|e| error_response(&e))?;
    Ok(Json(DepartmentChange {
        changed,
        departments: college.departments,
    }))
}
