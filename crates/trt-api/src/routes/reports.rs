//! # CSV Report Exports
//!
//! Each endpoint renders one of the four exports in trt-compliance as a
//! `text/csv` attachment. Reports are generated from a snapshot taken at
//! request time; two requests against unchanged stores download identical
//! files.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use trt_compliance::{
    attendance_csv, employee_csv, monthly_csv, pending_csv, pending_topics, refresher_csv,
    refresher_report,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::routes::compliance::EvaluationQuery;
use crate::state::AppState;

/// Date range for the attendance report, inclusive on both ends.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRangeQuery {
    fn resolve(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let from = parse_date(self.from.as_deref(), "from")?;
        let to = parse_date(self.to.as_deref(), "to")?;
        if from > to {
            return Err(AppError::Validation(
                "from must not be later than to".to_string(),
            ));
        }
        Ok((from, to))
    }
}

fn parse_date(raw: Option<&str>, field: &'static str) -> Result<NaiveDate, AppError> {
    let raw = raw.ok_or_else(|| AppError::Validation(format!("{field} is required")))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/reports/refresher.csv", get(refresher_export))
        .route("/v1/reports/pending.csv", get(pending_export))
        .route("/v1/reports/attendance.csv", get(attendance_export))
        .route("/v1/reports/employee.csv", get(employee_export))
        .route("/v1/reports/monthly.csv", get(monthly_export))
}

/// Wrap CSV text in a download response.
fn csv_response(filename: &str, body: String) -> Result<impl IntoResponse, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    let disposition = format!("attachment; filename=\"{filename}\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| AppError::Internal(format!("invalid content disposition: {e}")))?,
    );
    Ok((StatusCode::OK, headers, body))
}

/// GET /v1/reports/refresher.csv — Refresher status export.
#[utoipa::path(
    get,
    path = "/v1/reports/refresher.csv",
    params(
        ("department" = Option<String>, Query, description = "Department filter, 'All' for no filter"),
        ("lookback_days" = Option<u32>, Query, description = "Override the configured lookback window"),
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
async fn refresher_export(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<EvaluationQuery>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(trt_core::Role::can_view_reports, "export reports")?;
    let window = query.window(&state)?;
    let department = query.department()?;
    let snapshot = state.snapshot();

    let entries: Vec<_> = refresher_report(&snapshot, Utc::now(), window)
        .into_iter()
        .filter(|e| department.map_or(true, |d| e.department == d))
        .collect();

    csv_response("refresher-report.csv", refresher_csv(&entries))
}

/// GET /v1/reports/pending.csv — Pending topics export.
#[utoipa::path(
    get,
    path = "/v1/reports/pending.csv",
    params(
        ("department" = Option<String>, Query, description = "Department filter, 'All' for no filter"),
        ("lookback_days" = Option<u32>, Query, description = "Override the configured lookback window"),
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
async fn pending_export(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<EvaluationQuery>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(trt_core::Role::can_view_reports, "export reports")?;
    let window = query.window(&state)?;
    let department = query.department()?;
    let snapshot = state.snapshot();

    let entries: Vec<_> = pending_topics(&snapshot, Utc::now(), window)
        .into_iter()
        .filter(|e| department.map_or(true, |d| e.employee.department == d))
        .collect();

    csv_response("pending-report.csv", pending_csv(&entries))
}

/// GET /v1/reports/attendance.csv — Per-session attendance in a date range.
#[utoipa::path(
    get,
    path = "/v1/reports/attendance.csv",
    params(
        ("from" = String, Query, description = "Range start, YYYY-MM-DD"),
        ("to" = String, Query, description = "Range end, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
        (status = 422, description = "Invalid date range", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
async fn attendance_export(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(trt_core::Role::can_view_reports, "export reports")?;
    let (from, to) = query.resolve()?;
    let snapshot = state.snapshot();

    csv_response("attendance-report.csv", attendance_csv(&snapshot, from, to))
}

/// GET /v1/reports/employee.csv — Per-employee training history.
///
/// Each employee's attended sessions with topic, date and rating, plus a
/// pending-topics column. `employee_id` restricts the export to one
/// employee and 404s when the id is unknown.
#[utoipa::path(
    get,
    path = "/v1/reports/employee.csv",
    params(
        ("department" = Option<String>, Query, description = "Department filter, 'All' for no filter"),
        ("employee_id" = Option<Uuid>, Query, description = "Restrict to a single employee"),
        ("lookback_days" = Option<u32>, Query, description = "Override the configured lookback window"),
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
        (status = 404, description = "Unknown employee", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
async fn employee_export(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<EvaluationQuery>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(trt_core::Role::can_view_reports, "export reports")?;
    let window = query.window(&state)?;
    let department = query.department()?;
    let mut snapshot = state.snapshot();

    if let Some(raw) = query.employee_id {
        let id = trt_core::EmployeeId::from(raw);
        if !state.employees.contains(&id) {
            return Err(AppError::NotFound(format!("employee {id} not found")));
        }
        snapshot.employees.retain(|e| e.id == id);
    }
    if let Some(d) = department {
        snapshot.employees.retain(|e| e.department == d);
    }

    csv_response(
        "employee-training-report.csv",
        employee_csv(&snapshot, Utc::now(), window),
    )
}

/// GET /v1/reports/monthly.csv — Monthly session summary.
#[utoipa::path(
    get,
    path = "/v1/reports/monthly.csv",
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
async fn monthly_export(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, AppError> {
    caller.require(trt_core::Role::can_view_reports, "export reports")?;
    let snapshot = state.snapshot();

    csv_response("monthly-summary.csv", monthly_csv(&snapshot))
}
