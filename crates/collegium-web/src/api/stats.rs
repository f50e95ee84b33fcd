use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use collegium_core::{college_summaries, CollegeSummary, DepartmentStats, Totals};
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::session::ApiUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/departments", get(departments))
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub totals: Totals,
    pub colleges: Vec<CollegeSummary>,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentQuery {
    pub college: Option<String>,
}

async fn overview(
    State(state): State<AppState>,
    _user: ApiUser,
) -> Result<Json<OverviewResponse>, (StatusCode, String)> {
    let colleges = state.colleges.list().await.map_err(|e| error_response(&e))?;
    Ok(Json(OverviewResponse {
        totals: Totals::from_colleges(&colleges),
        colleges: college_summaries(&colleges),
    }))
}

async fn departments(
    State(state): State<AppState>,
    _user: ApiUser,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<BTreeMap<String, DepartmentStats>>, (StatusCode, String)> {
    let filter = query.college.as_deref().filter(|name| !name.is_empty());
    let stats = state
        .colleges
        .department_stats(filter)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(stats))
}
