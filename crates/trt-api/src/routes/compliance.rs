//! # Compliance Query API
//!
//! Read-only evaluation endpoints. Each request assembles an immutable
//! snapshot of the stores, runs the pure evaluator against it, and
//! discards the snapshot; nothing here mutates state.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use trt_compliance::{
    pending_for_employee, pending_topics, refresher_report, LookbackWindow, PendingEntry,
    RefresherEntry,
};
use trt_core::{Department, EmployeeId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::routes::employees::DepartmentFilter;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Query parameters shared by the evaluation endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct EvaluationQuery {
    pub department: Option<String>,
    pub employee_id: Option<Uuid>,
    /// Override of the configured lookback window, in days.
    pub lookback_days: Option<u32>,
}

impl EvaluationQuery {
    pub(crate) fn window(&self, state: &AppState) -> Result<LookbackWindow, AppError> {
        match self.lookback_days {
            Some(days) => Ok(LookbackWindow::new(days)?),
            None => Ok(state.config.lookback),
        }
    }

    pub(crate) fn department(&self) -> Result<Option<Department>, AppError> {
        DepartmentFilter {
            department: self.department.clone(),
        }
        .resolve()
    }
}

/// Pending evaluation result.
#[derive(Debug, Serialize, ToSchema)]
pub struct PendingResponse {
    /// Days in the window the evaluation used.
    pub lookback_days: u32,
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<PendingEntry>,
}

/// Refresher evaluation result.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefresherResponse {
    pub lookback_days: u32,
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<RefresherEntry>,
}

/// Aggregate counts for the dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub employees: usize,
    pub topics: usize,
    pub schedules: usize,
    pub attendances: usize,
    /// Attendance records with `attended` set.
    pub attended: usize,
    /// Mean rating across all attendance records, absent when there are none.
    pub average_rating: Option<f64>,
    /// Employees with at least one pending topic under the configured window.
    pub pending_employees: usize,
}

/// Build the compliance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/compliance/pending", get(pending))
        .route("/v1/compliance/refresher", get(refresher))
        .route("/v1/dashboard", get(dashboard))
}

/// GET /v1/compliance/pending — Pending topics per employee.
///
/// With `employee_id`, evaluates just that employee and 404s when the id
/// is unknown. With `department`, keeps only entries for employees of
/// that department.
#[utoipa::path(
    get,
    path = "/v1/compliance/pending",
    params(
        ("department" = Option<String>, Query, description = "Department filter, 'All' for no filter"),
        ("employee_id" = Option<Uuid>, Query, description = "Evaluate a single employee"),
        ("lookback_days" = Option<u32>, Query, description = "Override the configured lookback window"),
    ),
    responses(
        (status = 200, description = "Pending evaluation", body = PendingResponse),
        (status = 404, description = "Unknown employee", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "compliance"
)]
async fn pending(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<EvaluationQuery>,
) -> Result<Json<ApiResponse<PendingResponse>>, AppError> {
    let window = query.window(&state)?;
    let department = query.department()?;
    let snapshot = state.snapshot();
    let as_of = Utc::now();

    let entries = match query.employee_id {
        Some(raw) => {
            let id = EmployeeId::from(raw);
            if !state.employees.contains(&id) {
                return Err(AppError::NotFound(format!("employee {id} not found")));
            }
            pending_for_employee(&snapshot, id, as_of, window)
                .into_iter()
                .collect()
        }
        None => pending_topics(&snapshot, as_of, window),
    };

    let entries: Vec<PendingEntry> = entries
        .into_iter()
        .filter(|e| department.map_or(true, |d| e.employee.department == d))
        .collect();

    Ok(Json(ApiResponse::new(PendingResponse {
        lookback_days: window.days(),
        entries,
    })))
}

/// GET /v1/compliance/refresher — Refresher classification per topic.
#[utoipa::path(
    get,
    path = "/v1/compliance/refresher",
    params(
        ("department" = Option<String>, Query, description = "Department filter, 'All' for no filter"),
        ("lookback_days" = Option<u32>, Query, description = "Override the configured lookback window"),
    ),
    responses(
        (status = 200, description = "Refresher evaluation", body = RefresherResponse),
    ),
    security(("bearer" = [])),
    tag = "compliance"
)]
async fn refresher(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<EvaluationQuery>,
) -> Result<Json<ApiResponse<RefresherResponse>>, AppError> {
    let window = query.window(&state)?;
    let department = query.department()?;
    let snapshot = state.snapshot();

    let entries: Vec<RefresherEntry> = refresher_report(&snapshot, Utc::now(), window)
        .into_iter()
        .filter(|e| department.map_or(true, |d| e.department == d))
        .collect();

    Ok(Json(ApiResponse::new(RefresherResponse {
        lookback_days: window.days(),
        entries,
    })))
}

/// GET /v1/dashboard — Aggregate counts.
#[utoipa::path(
    get,
    path = "/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard counts", body = DashboardResponse),
    ),
    security(("bearer" = [])),
    tag = "compliance"
)]
async fn dashboard(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let snapshot = state.snapshot();
    let pending = pending_topics(&snapshot, Utc::now(), state.config.lookback);

    let records = state.attendances.list();
    let attended = records.iter().filter(|r| r.attended).count();
    let average_rating = if records.is_empty() {
        None
    } else {
        let sum: u32 = records.iter().map(|r| u32::from(r.rating.value())).sum();
        Some(f64::from(sum) / records.len() as f64)
    };

    Ok(Json(ApiResponse::new(DashboardResponse {
        employees: state.employees.len(),
        topics: state.topics.len(),
        schedules: state.schedules.len(),
        attendances: records.len(),
        attended,
        average_rating,
        pending_employees: pending.len(),
    })))
}
