use std::collections::BTreeMap;
use std::fmt::Write as _;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use collegium_core::{
    college_summaries, college_summary_csv, department_stats, department_stats_csv, College,
    DepartmentStats, StudentCategory, Totals,
};
use serde::Deserialize;

use super::layout::{bare_page, esc, group_digits, page, url_encode, Section};
use super::{flashes, load_colleges};
use crate::download::{attachment, CSV_CONTENT_TYPE};
use crate::session::ViewUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard))
        .route("/stats/print", get(print_view))
        .route("/stats/export/colleges.csv", get(export_colleges))
        .route("/stats/export/departments.csv", get(export_departments))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// Restrict the department table to colleges with this name
    pub college: Option<String>,
    /// Category plotted in the department comparison chart
    pub metric: Option<String>,
}

impl StatsQuery {
    fn college(&self) -> Option<&str> {
        self.college.as_deref().filter(|name| !name.is_empty())
    }

    fn metric(&self) -> StudentCategory {
        self.metric
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or(StudentCategory::Total)
    }
}

/// Horizontal bar chart; bar widths are relative to the largest value.
fn bar_chart(title: &str, rows: &[(String, f64)]) -> String {
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    let mut bars = String::new();
    for (label, value) in rows {
        let width = if max > 0.0 { value / max * 100.0 } else { 0.0 };
        let _ = write!(
            bars,
            r#"<div class="bar-row"><span class="bar-label">{}</span><span class="bar" style="width: {width:.1}%"></span><span class="bar-value">{value:.2}</span></div>"#,
            esc(label),
        );
    }

    format!(r#"<figure class="chart"><figcaption>{}</figcaption>{bars}</figure>"#, esc(title))
}

fn summary_table(colleges: &[College]) -> String {
    let mut head = String::from("<th>College</th>");
    for category in StudentCategory::ALL {
        let _ = write!(head, "<th>{}</th>", category.label());
    }
    head.push_str("<th>Departments</th>");

    let mut rows = String::new();
    for row in college_summaries(colleges) {
        let _ = write!(rows, "<tr><td>{}</td>", esc(&row.name));
        for count in row.counts {
            let _ = write!(rows, "<td>{}</td>", group_digits(count));
        }
        let _ = write!(rows, "<td>{}</td></tr>", row.department_count);
    }

    format!(r#"<table class="stats-table"><thead><tr>{head}</tr></thead><tbody>{rows}</tbody></table>"#)
}

fn department_table(stats: &BTreeMap<String, DepartmentStats>) -> String {
    let mut head = String::from("<th>Department</th>");
    for category in StudentCategory::ALL {
        let _ = write!(head, "<th>{}</th>", category.label());
    }

    let mut rows = String::new();
    for (department, values) in stats {
        let _ = write!(rows, "<tr><td>{}</td>", esc(department));
        for category in StudentCategory::ALL {
            let _ = write!(rows, "<td>{:.2}</td>", values.get(category));
        }
        rows.push_str("</tr>");
    }

    format!(r#"<table class="stats-table"><thead><tr>{head}</tr></thead><tbody>{rows}</tbody></table>"#)
}

fn metric_cards(totals: &Totals) -> String {
    let mut cards = String::new();
    for category in StudentCategory::ALL {
        let _ = write!(
            cards,
            r#"<div class="stat-card"><h4>{}</h4><p>{}</p></div>"#,
            category.label(),
            group_digits(totals.get(category))
        );
    }
    format!(r#"<div class="student-stats">{cards}</div>"#)
}

fn department_section(colleges: &[College], query: &StatsQuery) -> String {
    let filter = query.college();
    let metric = query.metric();

    let mut college_options = String::from(r#"<option value="">All colleges</option>"#);
    let mut seen: Vec<&str> = Vec::new();
    for college in colleges {
        if seen.contains(&college.name()) {
            continue;
        }
        seen.push(college.name());
        let marker = if filter == Some(college.name()) { " selected" } else { "" };
        let _ = write!(
            college_options,
            r#"<option value="{0}"{marker}>{0}</option>"#,
            esc(college.name())
        );
    }

    let mut metric_options = String::new();
    for category in StudentCategory::ALL {
        let marker = if category == metric { " selected" } else { "" };
        let _ = write!(
            metric_options,
            r#"<option value="{}"{marker}>{}</option>"#,
            category.as_str(),
            category.label()
        );
    }

    let mut out = format!(
        r#"<h2>Department statistics</h2>
<form method="get" action="/stats" class="card inline-form no-print">
  <label>College <select name="college">{college_options}</select></label>
  <label>Compare by <select name="metric">{metric_options}</select></label>
  <button type="submit">Apply</button>
</form>"#
    );

    let stats = department_stats(colleges, filter);
    if stats.is_empty() {
        out.push_str(r#"<p class="info">No departments have been added yet.</p>"#);
        return out;
    }

    let export_href = filter.map_or_else(
        || "/stats/export/departments.csv".to_string(),
        |name| format!("/stats/export/departments.csv?college={}", url_encode(name)),
    );
    let chart_rows: Vec<(String, f64)> = stats
        .iter()
        .map(|(department, values)| (department.clone(), values.get(metric)))
        .collect();

    let _ = write!(
        out,
        r#"{table}
<p class="actions no-print"><a class="button" href="{export_href}">Download department report (CSV)</a></p>
<h3>Department comparison</h3>
{chart}"#,
        table = department_table(&stats),
        chart = bar_chart(metric.label(), &chart_rows),
    );
    out
}

fn distribution_section(colleges: &[College]) -> String {
    let mut out = String::from("<h2>Students by college</h2>");
    for category in StudentCategory::ALL {
        #[allow(clippy::cast_precision_loss)]
        let rows: Vec<(String, f64)> = colleges
            .iter()
            .map(|c| (c.name().to_string(), c.count(category) as f64))
            .collect();
        out.push_str(&bar_chart(category.label(), &rows));
    }
    out
}

async fn dashboard(
    State(state): State<AppState>,
    user: ViewUser,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let (colleges, error) = load_colleges(&state).await;
    let totals = Totals::from_colleges(&colleges);

    let body = format!(
        r#"{cards}
<h2>College overview</h2>
<p class="actions no-print">
  <a class="button" href="/stats/export/colleges.csv">Download college report (CSV)</a>
  <a class="button" href="/stats/print" target="_blank">Print view</a>
</p>
{summary}
{departments}
{distribution}"#,
        cards = metric_cards(&totals),
        summary = summary_table(&colleges),
        departments = department_section(&colleges, &query),
        distribution = distribution_section(&colleges),
    );

    let flashes = flashes(&state, &user, error).await;
    page("Statistics", Section::Stats, &user.username, &flashes, &body)
}

async fn print_view(State(state): State<AppState>, _user: ViewUser) -> impl IntoResponse {
    let (colleges, error) = load_colleges(&state).await;
    let totals = Totals::from_colleges(&colleges);

    let body = format!(
        "{cards}\n{summary}\n<script>window.print();</script>",
        cards = metric_cards(&totals),
        summary = summary_table(&colleges),
    );
    let flashes: Vec<_> = error.into_iter().collect();
    bare_page("College statistics", &flashes, &body)
}

fn csv_response(filename: &str, result: collegium_core::Result<Vec<u8>>) -> Response {
    match result {
        Ok(bytes) => attachment(filename, CSV_CONTENT_TYPE, bytes),
        Err(e) => {
            tracing::error!(error = %e, filename, "Export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {e}")).into_response()
        }
    }
}

async fn export_colleges(State(state): State<AppState>, _user: ViewUser) -> Response {
    match state.colleges.list().await {
        Ok(colleges) => csv_response("college_stats.csv", college_summary_csv(&colleges)),
        Err(e) => csv_response("college_stats.csv", Err(e)),
    }
}

async fn export_departments(
    State(state): State<AppState>,
    _user: ViewUser,
    Query(query): Query<StatsQuery>,
) -> Response {
    let result = match state.colleges.department_stats(query.college()).await {
        Ok(stats) => department_stats_csv(&stats),
        Err(e) => Err(e),
    };
    csv_response("department_stats.csv", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_chart_scales_to_max() {
        let html = bar_chart("Total", &[("A".into(), 50.0), ("B".into(), 100.0)]);
        assert!(html.contains("width: 50.0%"));
        assert!(html.contains("width: 100.0%"));
    }

    #[test]
    fn test_bar_chart_all_zero() {
        let html = bar_chart("Total", &[("A".into(), 0.0)]);
        assert!(html.contains("width: 0.0%"));
    }

    #[test]
    fn test_stats_query_defaults() {
        let query = StatsQuery {
            college: Some(String::new()),
            metric: Some("nonsense".into()),
        };
        assert_eq!(query.college(), None);
        assert_eq!(query.metric(), StudentCategory::Total);

        let query = StatsQuery {
            college: Some("Science".into()),
            metric: Some("dorm_students".into()),
        };
        assert_eq!(query.college(), Some("Science"));
        assert_eq!(query.metric(), StudentCategory::Dorm);
    }
}
