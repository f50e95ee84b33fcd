use std::fmt::Write as _;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use collegium_core::{parse_department_list, College, CollegeFields, StudentCategory};
use serde::Deserialize;
use uuid::Uuid;

use super::layout::{esc, group_digits, page, Section};
use super::{error_flash, flashes, load_colleges, not_found};
use crate::session::ViewUser;
use crate::state::{AppState, FlashKind};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/colleges", get(list_colleges).post(create_college))
        .route("/colleges/new", get(new_college))
        .route("/colleges/{id}", post(update_college))
        .route("/colleges/{id}/edit", get(edit_college))
        .route("/colleges/{id}/delete", post(delete_college))
        .route("/colleges/{id}/departments", get(departments).post(replace_departments))
        .route("/colleges/{id}/departments/add", post(add_department))
        .route("/colleges/{id}/departments/remove", post(remove_department))
}

/// Add/edit form. Counts are kept as text: a cleared number input is
/// submitted as `key=` and counts as 0.
#[derive(Debug, Deserialize)]
pub struct CollegeForm {
    pub name: String,
    #[serde(default)]
    pub students_count: String,
    #[serde(default)]
    pub foreign_students: String,
    #[serde(default)]
    pub graduate_students: String,
    #[serde(default)]
    pub dorm_students: String,
    #[serde(default)]
    pub evening_students: String,
    #[serde(default)]
    pub evening_hosted_students: String,
    #[serde(default)]
    pub departments: String,
}

fn parse_count(category: StudentCategory, raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| format!("{} must be a whole number, got \"{raw}\"", category.label()))
}

impl CollegeForm {
    /// Validated fields and department list, or the message to flash.
    fn into_parts(self) -> Result<(CollegeFields, Vec<String>), String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("College name is required".to_string());
        }

        let fields = CollegeFields {
            name,
            students_count: parse_count(StudentCategory::Total, &self.students_count)?,
            foreign_students: parse_count(StudentCategory::Foreign, &self.foreign_students)?,
            graduate_students: parse_count(StudentCategory::Graduate, &self.graduate_students)?,
            dorm_students: parse_count(StudentCategory::Dorm, &self.dorm_students)?,
            evening_students: parse_count(StudentCategory::Evening, &self.evening_students)?,
            evening_hosted_students: parse_count(
                StudentCategory::EveningHosted,
                &self.evening_hosted_students,
            )?,
        };
        Ok((fields, parse_department_list(&self.departments)))
    }
}

#[derive(Debug, Deserialize)]
pub struct DepartmentForm {
    pub department: String,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentListForm {
    #[serde(default)]
    pub departments: String,
}

fn college_card(college: &College) -> String {
    let mut stats = String::new();
    for category in StudentCategory::ALL {
        let _ = write!(
            stats,
            r#"<div class="stat-card"><h4>{}</h4><p>{}</p></div>"#,
            category.label(),
            group_digits(college.count(category))
        );
    }

    let departments = if college.departments.is_empty() {
        "<p class=\"muted\">No departments yet.</p>".to_string()
    } else {
        let items: String = college
            .departments
            .iter()
            .map(|d| format!("<li>{}</li>", esc(d)))
            .collect();
        format!("<ul>{items}</ul>")
    };

    format!(
        r#"<article class="college-card">
  <h3>{name}</h3>
  <div class="student-stats">{stats}</div>
  <div class="departments-section"><h4>Departments</h4>{departments}</div>
  <div class="actions no-print">
    <a class="button" href="/colleges/{id}/edit">Edit</a>
    <a class="button" href="/colleges/{id}/departments">Manage departments</a>
    <a class="button" href="/files?college={id}">Files</a>
    <form method="post" action="/colleges/{id}/delete" class="inline">
      <button type="submit" class="danger">Delete</button>
    </form>
  </div>
</article>"#,
        name = esc(college.name()),
        id = college.id,
    )
}

async fn list_colleges(State(state): State<AppState>, user: ViewUser) -> impl IntoResponse {
    let (colleges, error) = load_colleges(&state).await;

    let mut body = String::from(
        r#"<p class="actions"><a class="button" href="/colleges/new">Add a new college</a></p>"#,
    );
    if colleges.is_empty() {
        body.push_str(r#"<p class="info">No colleges have been added yet.</p>"#);
    }
    for college in &colleges {
        body.push_str(&college_card(college));
    }

    let flashes = flashes(&state, &user, error).await;
    page("Colleges", Section::Colleges, &user.username, &flashes, &body)
}

fn college_form(action: &str, submit: &str, fields: &CollegeFields, departments: &[String]) -> String {
    let mut inputs = String::new();
    for category in StudentCategory::ALL {
        let _ = write!(
            inputs,
            r#"<label>{label} <input type="number" min="0" step="1" name="{key}" value="{value}"></label>"#,
            label = category.label(),
            key = category.as_str(),
            value = fields.count(category),
        );
    }

    format!(
        r#"<form method="post" action="{action}" class="card college-form">
  <label>College name <input name="name" value="{name}" required></label>
  <div class="grid">{inputs}</div>
  <label>Departments (one per line)
    <textarea name="departments" rows="8">{departments}</textarea>
  </label>
  <button type="submit">{submit}</button>
  <a href="/colleges">Cancel</a>
</form>"#,
        name = esc(&fields.name),
        departments = esc(&departments.join("\n")),
    )
}

async fn new_college(State(state): State<AppState>, user: ViewUser) -> impl IntoResponse {
    let body = college_form("/colleges", "Add college", &CollegeFields::default(), &[]);
    let flashes = flashes(&state, &user, None).await;
    page("Add a college", Section::Colleges, &user.username, &flashes, &body)
}

async fn create_college(
    State(state): State<AppState>,
    user: ViewUser,
    Form(form): Form<CollegeForm>,
) -> Redirect {
    let (fields, departments) = match form.into_parts() {
        Ok(parts) => parts,
        Err(message) => {
            state.flash(user.session_id, FlashKind::Error, message).await;
            return Redirect::to("/colleges/new");
        }
    };

    match state.colleges.add(fields, departments).await {
        Ok(college) => {
            let text = format!("Added college {}", college.name());
            state.flash(user.session_id, FlashKind::Success, text).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add college");
            let text = format!("Could not save the college: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
    }
    Redirect::to("/colleges")
}

async fn edit_college(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
) -> Response {
    let college = match state.colleges.get(id).await {
        Ok(college) => college,
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            let flashes = flashes(&state, &user, Some(error_flash(e.to_string()))).await;
            return page("Edit college", Section::Colleges, &user.username, &flashes, "")
                .into_response();
        }
    };

    let body = college_form(
        &format!("/colleges/{id}"),
        "Save changes",
        &college.fields,
        &college.departments,
    );
    let flashes = flashes(&state, &user, None).await;
    let title = format!("Edit {}", college.name());
    page(&title, Section::Colleges, &user.username, &flashes, &body).into_response()
}

async fn update_college(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
    Form(form): Form<CollegeForm>,
) -> Response {
    let (fields, departments) = match form.into_parts() {
        Ok(parts) => parts,
        Err(message) => {
            state.flash(user.session_id, FlashKind::Error, message).await;
            return Redirect::to(&format!("/colleges/{id}/edit")).into_response();
        }
    };

    match state.colleges.update(id, fields, Some(departments)).await {
        Ok(college) => {
            let text = format!("Updated {}", college.name());
            state.flash(user.session_id, FlashKind::Success, text).await;
        }
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            tracing::error!(error = %e, %id, "Failed to update college");
            let text = format!("Could not update the college: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
    }
    Redirect::to("/colleges").into_response()
}

async fn delete_college(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state.colleges.delete(id).await {
        Ok(()) => {
            if let Err(e) = state.files.remove_college(id).await {
                tracing::warn!(error = %e, %id, "Failed to remove college files");
            }
            state.flash(user.session_id, FlashKind::Success, "College deleted").await;
        }
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            tracing::error!(error = %e, %id, "Failed to delete college");
            let text = format!("Could not delete the college: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
    }
    Redirect::to("/colleges").into_response()
}

async fn departments(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
) -> Response {
    let college = match state.colleges.get(id).await {
        Ok(college) => college,
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            let flashes = flashes(&state, &user, Some(error_flash(e.to_string()))).await;
            return page("Departments", Section::Colleges, &user.username, &flashes, "")
                .into_response();
        }
    };

    let mut rows = String::new();
    for department in &college.departments {
        let _ = write!(
            rows,
            r#"<li>{name}
  <form method="post" action="/colleges/{id}/departments/remove" class="inline">
    <input type="hidden" name="department" value="{name}">
    <button type="submit" class="danger small">Remove</button>
  </form>
</li>"#,
            name = esc(department),
        );
    }
    if rows.is_empty() {
        rows.push_str(r#"<li class="muted">No departments yet.</li>"#);
    }

    let body = format!(
        r#"<ul class="department-list">{rows}</ul>
<form method="post" action="/colleges/{id}/departments/add" class="card inline-form">
  <label>New department <input name="department" required></label>
  <button type="submit">Add</button>
</form>
<form method="post" action="/colleges/{id}/departments" class="card">
  <label>Edit all departments (one per line)
    <textarea name="departments" rows="10">{all}</textarea>
  </label>
  <button type="submit">Save departments</button>
</form>
<p><a href="/colleges">Back to colleges</a></p>"#,
        all = esc(&college.departments.join("\n")),
    );

    let flashes = flashes(&state, &user, None).await;
    let title = format!("Departments of {}", college.name());
    page(&title, Section::Colleges, &user.username, &flashes, &body).into_response()
}

async fn replace_departments(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
    Form(form): Form<DepartmentListForm>,
) -> Response {
    let back = format!("/colleges/{id}/departments");
    let departments = parse_department_list(&form.departments);
    if departments.is_empty() {
        state.flash(user.session_id, FlashKind::Error, "Enter at least one department").await;
        return Redirect::to(&back).into_response();
    }

    match state.colleges.set_departments(id, departments).await {
        Ok(_) => state.flash(user.session_id, FlashKind::Success, "Departments updated").await,
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            tracing::error!(error = %e, %id, "Failed to update departments");
            let text = format!("Could not update departments: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
    }
    Redirect::to(&back).into_response()
}

async fn add_department(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
    Form(form): Form<DepartmentForm>,
) -> Response {
    let back = format!("/colleges/{id}/departments");
    let department = form.department.trim();
    if department.is_empty() {
        state.flash(user.session_id, FlashKind::Error, "Department name is required").await;
        return Redirect::to(&back).into_response();
    }

    match state.colleges.add_department(id, department).await {
        Ok(true) => {
            let text = format!("Added department {department}");
            state.flash(user.session_id, FlashKind::Success, text).await;
        }
        Ok(false) => {
            let text = format!("{department} is already listed");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            tracing::error!(error = %e, %id, "Failed to add department");
            let text = format!("Could not add the department: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
    }
    Redirect::to(&back).into_response()
}

async fn remove_department(
    State(state): State<AppState>,
    user: ViewUser,
    Path(id): Path<Uuid>,
    Form(form): Form<DepartmentForm>,
) -> Response {
    let back = format!("/colleges/{id}/departments");

    match state.colleges.remove_department(id, &form.department).await {
        Ok(true) => {
            let text = format!("Removed department {}", form.department);
            state.flash(user.session_id, FlashKind::Success, text).await;
        }
        Ok(false) => {}
        Err(e) if e.is_not_found() => return not_found(&user, "The college"),
        Err(e) => {
            tracing::error!(error = %e, %id, "Failed to remove department");
            let text = format!("Could not remove the department: {e}");
            state.flash(user.session_id, FlashKind::Error, text).await;
        }
    }
    Redirect::to(&back).into_response()
}
