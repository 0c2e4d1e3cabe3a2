//! # Attendance API
//!
//! One record per (schedule, employee) pair. Marking attendance for an
//! employee who was not invited to the session is a validation error, and
//! marking the same pair twice is a conflict; corrections go through PUT
//! on the existing record.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use trt_core::{AttendanceId, EmployeeId, Rating, Role, ScheduleId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::ApiResponse;
use crate::state::{AppState, AttendanceRecord};

/// Request to mark attendance.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRequest {
    #[schema(value_type = uuid::Uuid)]
    pub schedule_id: ScheduleId,
    #[schema(value_type = uuid::Uuid)]
    pub employee_id: EmployeeId,
    pub attended: bool,
    #[schema(value_type = u8)]
    pub rating: Rating,
}

impl Validate for AttendanceRequest {
    fn validate(&self) -> Result<(), AppError> {
        // Rating range is enforced by the Rating deserializer.
        Ok(())
    }
}

/// Request to correct an existing attendance record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceUpdateRequest {
    pub attended: bool,
    #[schema(value_type = u8)]
    pub rating: Rating,
}

impl Validate for AttendanceUpdateRequest {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Optional filters for attendance listings.
#[derive(Debug, Default, Deserialize)]
pub struct AttendanceFilter {
    pub schedule_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

/// Build the attendances router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/attendances",
            get(list_attendances).post(mark_attendance),
        )
        .route(
            "/v1/attendances/:id",
            get(get_attendance)
                .put(update_attendance)
                .delete(delete_attendance),
        )
}

/// GET /v1/attendances — List attendance records, optionally filtered.
#[utoipa::path(
    get,
    path = "/v1/attendances",
    params(
        ("schedule_id" = Option<Uuid>, Query, description = "Filter by schedule"),
        ("employee_id" = Option<Uuid>, Query, description = "Filter by employee"),
    ),
    responses(
        (status = 200, description = "Attendance list", body = Vec<AttendanceRecord>),
    ),
    security(("bearer" = [])),
    tag = "attendances"
)]
async fn list_attendances(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(filter): Query<AttendanceFilter>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecord>>>, AppError> {
    let schedule = filter.schedule_id.map(ScheduleId::from);
    let employee = filter.employee_id.map(EmployeeId::from);

    let mut records: Vec<AttendanceRecord> = state
        .attendances
        .list()
        .into_iter()
        .filter(|a| schedule.map_or(true, |s| a.schedule_id == s))
        .filter(|a| employee.map_or(true, |e| a.employee_id == e))
        .collect();
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    Ok(Json(ApiResponse::new(records)))
}

/// POST /v1/attendances — Mark attendance for an invited employee.
#[utoipa::path(
    post,
    path = "/v1/attendances",
    request_body = AttendanceRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 409, description = "Already recorded for this pair", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown reference or uninvited employee", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "attendances"
)]
async fn mark_attendance(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<AttendanceRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<AttendanceRecord>>), AppError> {
    caller.require(Role::can_mark_attendance, "mark attendance")?;
    let req = extract_validated_json(body)?;

    let schedule = state.schedules.get(&req.schedule_id).ok_or_else(|| {
        AppError::Validation(format!("schedule {} does not exist", req.schedule_id))
    })?;
    if !state.employees.contains(&req.employee_id) {
        return Err(AppError::Validation(format!(
            "employee {} does not exist",
            req.employee_id
        )));
    }
    if !schedule.employee_ids.contains(&req.employee_id) {
        return Err(AppError::Validation(format!(
            "employee {} was not invited to schedule {}",
            req.employee_id, req.schedule_id
        )));
    }
    let now = Utc::now();
    let record = AttendanceRecord {
        id: AttendanceId::new(),
        schedule_id: req.schedule_id,
        employee_id: req.employee_id,
        attended: req.attended,
        rating: req.rating,
        created_at: now,
        updated_at: now,
    };

    // Uniqueness check and insert share one write lock, so concurrent
    // requests for the same pair cannot both get past the check. The
    // database enforces the same pair uniqueness with a unique index.
    state
        .attendances
        .insert_unless(record.id, record.clone(), |a| {
            a.schedule_id == req.schedule_id && a.employee_id == req.employee_id
        })
        .map_err(|_| {
            AppError::Conflict(format!(
                "attendance already recorded for employee {} on schedule {}",
                req.employee_id, req.schedule_id
            ))
        })?;
    persist(&state, &record).await?;

    tracing::info!(
        attendance_id = %record.id,
        schedule_id = %record.schedule_id,
        employee_id = %record.employee_id,
        attended = record.attended,
        "attendance recorded"
    );
    Ok((axum::http::StatusCode::CREATED, Json(ApiResponse::new(record))))
}

/// GET /v1/attendances/:id — Fetch one attendance record.
#[utoipa::path(
    get,
    path = "/v1/attendances/{id}",
    params(("id" = Uuid, Path, description = "Attendance ID")),
    responses(
        (status = 200, description = "Attendance found", body = AttendanceRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "attendances"
)]
async fn get_attendance(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AttendanceRecord>>, AppError> {
    let record = state
        .attendances
        .get(&id.into())
        .ok_or_else(|| AppError::NotFound(format!("attendance {id} not found")))?;

    Ok(Json(ApiResponse::new(record)))
}

/// PUT /v1/attendances/:id — Correct an attendance record.
///
/// The (schedule, employee) pair is immutable; only the attended flag and
/// rating can change.
#[utoipa::path(
    put,
    path = "/v1/attendances/{id}",
    params(("id" = Uuid, Path, description = "Attendance ID")),
    request_body = AttendanceUpdateRequest,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "attendances"
)]
async fn update_attendance(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<AttendanceUpdateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AttendanceRecord>>, AppError> {
    caller.require(Role::can_mark_attendance, "update attendance")?;
    let req = extract_validated_json(body)?;

    let id = AttendanceId::from(id);
    let existing = state
        .attendances
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("attendance {id} not found")))?;

    let record = AttendanceRecord {
        attended: req.attended,
        rating: req.rating,
        updated_at: Utc::now(),
        ..existing
    };

    state.attendances.insert(id, record.clone());
    persist(&state, &record).await?;

    Ok(Json(ApiResponse::new(record)))
}

/// DELETE /v1/attendances/:id — Remove an attendance record.
#[utoipa::path(
    delete,
    path = "/v1/attendances/{id}",
    params(("id" = Uuid, Path, description = "Attendance ID")),
    responses(
        (status = 200, description = "Attendance removed", body = AttendanceRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "attendances"
)]
async fn delete_attendance(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AttendanceRecord>>, AppError> {
    caller.require(Role::can_mark_attendance, "delete attendance")?;

    let id = AttendanceId::from(id);
    let record = state
        .attendances
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("attendance {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::attendances::delete(pool, *id.as_uuid()).await {
            tracing::error!(attendance_id = %id, error = %e, "failed to delete attendance from database");
            return Err(AppError::Internal(
                "attendance removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    Ok(Json(ApiResponse::new(record)))
}

async fn persist(state: &AppState, record: &AttendanceRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::attendances::upsert(pool, record).await {
            tracing::error!(attendance_id = %record.id, error = %e, "failed to persist attendance to database");
            return Err(AppError::Internal(
                "attendance recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
