//! # Training Schedule API
//!
//! A schedule is one training session: a date, the topics covered, the
//! invited employees, and the trainer. Creating or updating a schedule
//! checks every referenced topic and employee id against the catalog so a
//! session can never be born pointing at nothing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use trt_core::{EmployeeId, Role, ScheduleId, TopicId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_non_empty, Validate};
use crate::routes::ApiResponse;
use crate::state::{AppState, ScheduleRecord};

/// Request to create or replace a schedule.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleRequest {
    pub date: DateTime<Utc>,
    #[schema(value_type = Vec<uuid::Uuid>)]
    pub topic_ids: Vec<TopicId>,
    #[schema(value_type = Vec<uuid::Uuid>)]
    pub employee_ids: Vec<EmployeeId>,
    pub trainer_name: String,
}

impl Validate for ScheduleRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_non_empty(&self.trainer_name, "trainer_name")?;
        if self.topic_ids.is_empty() {
            return Err(AppError::Validation(
                "topic_ids must list at least one topic".to_string(),
            ));
        }
        if self.employee_ids.is_empty() {
            return Err(AppError::Validation(
                "employee_ids must list at least one employee".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the schedules router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/v1/schedules/:id",
            get(get_schedule)
                .put(update_schedule)
                .delete(delete_schedule),
        )
}

/// Check every referenced id against the catalog.
fn check_references(state: &AppState, req: &ScheduleRequest) -> Result<(), AppError> {
    for topic_id in &req.topic_ids {
        if !state.topics.contains(topic_id) {
            return Err(AppError::Validation(format!(
                "topic {topic_id} does not exist"
            )));
        }
    }
    for employee_id in &req.employee_ids {
        if !state.employees.contains(employee_id) {
            return Err(AppError::Validation(format!(
                "employee {employee_id} does not exist"
            )));
        }
    }
    Ok(())
}

/// GET /v1/schedules — List schedules, most recent first.
#[utoipa::path(
    get,
    path = "/v1/schedules",
    responses(
        (status = 200, description = "Schedule list", body = Vec<ScheduleRecord>),
    ),
    security(("bearer" = [])),
    tag = "schedules"
)]
async fn list_schedules(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> Result<Json<ApiResponse<Vec<ScheduleRecord>>>, AppError> {
    let mut schedules = state.schedules.list();
    schedules.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

    Ok(Json(ApiResponse::new(schedules)))
}

/// POST /v1/schedules — Create a training session.
#[utoipa::path(
    post,
    path = "/v1/schedules",
    request_body = ScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleRecord),
        (status = 422, description = "Invalid request or unknown reference", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "schedules"
)]
async fn create_schedule(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<ScheduleRecord>>), AppError> {
    caller.require(Role::can_manage_schedules, "create schedules")?;
    let req = extract_validated_json(body)?;
    check_references(&state, &req)?;

    let now = Utc::now();
    let record = ScheduleRecord {
        id: ScheduleId::new(),
        date: req.date,
        topic_ids: req.topic_ids,
        employee_ids: req.employee_ids,
        trainer_name: req.trainer_name,
        created_at: now,
        updated_at: now,
    };

    state.schedules.insert(record.id, record.clone());
    persist(&state, &record).await?;

    tracing::info!(
        schedule_id = %record.id,
        topics = record.topic_ids.len(),
        invited = record.employee_ids.len(),
        "schedule created"
    );
    Ok((axum::http::StatusCode::CREATED, Json(ApiResponse::new(record))))
}

/// GET /v1/schedules/:id — Fetch one schedule.
#[utoipa::path(
    get,
    path = "/v1/schedules/{id}",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule found", body = ScheduleRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "schedules"
)]
async fn get_schedule(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleRecord>>, AppError> {
    let record = state
        .schedules
        .get(&id.into())
        .ok_or_else(|| AppError::NotFound(format!("schedule {id} not found")))?;

    Ok(Json(ApiResponse::new(record)))
}

/// PUT /v1/schedules/:id — Replace a schedule.
#[utoipa::path(
    put,
    path = "/v1/schedules/{id}",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "schedules"
)]
async fn update_schedule(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ScheduleRecord>>, AppError> {
    caller.require(Role::can_manage_schedules, "update schedules")?;
    let req = extract_validated_json(body)?;
    check_references(&state, &req)?;

    let id = ScheduleId::from(id);
    let existing = state
        .schedules
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("schedule {id} not found")))?;

    let record = ScheduleRecord {
        id,
        date: req.date,
        topic_ids: req.topic_ids,
        employee_ids: req.employee_ids,
        trainer_name: req.trainer_name,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.schedules.insert(id, record.clone());
    persist(&state, &record).await?;

    Ok(Json(ApiResponse::new(record)))
}

/// DELETE /v1/schedules/:id — Remove a schedule.
#[utoipa::path(
    delete,
    path = "/v1/schedules/{id}",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule removed", body = ScheduleRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "schedules"
)]
async fn delete_schedule(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleRecord>>, AppError> {
    caller.require(Role::can_manage_schedules, "delete schedules")?;

    let id = ScheduleId::from(id);
    let record = state
        .schedules
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("schedule {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::schedules::delete(pool, *id.as_uuid()).await {
            tracing::error!(schedule_id = %id, error = %e, "failed to delete schedule from database");
            return Err(AppError::Internal(
                "schedule removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    Ok(Json(ApiResponse::new(record)))
}

async fn persist(state: &AppState, record: &ScheduleRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::schedules::upsert(pool, record).await {
            tracing::error!(schedule_id = %record.id, error = %e, "failed to persist schedule to database");
            return Err(AppError::Internal(
                "schedule recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> ScheduleRequest {
        ScheduleRequest {
            date: Utc::now(),
            topic_ids: vec![TopicId::new()],
            employee_ids: vec![EmployeeId::new()],
            trainer_name: "R. Varga".into(),
        }
    }

    #[test]
    fn request_requires_topics_and_employees() {
        let mut req = base_request();
        req.topic_ids.clear();
        assert!(req.validate().is_err());

        let mut req = base_request();
        req.employee_ids.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn request_requires_trainer_name() {
        let mut req = base_request();
        req.trainer_name = " ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_references_are_rejected() {
        let state = AppState::new();
        let req = base_request();
        assert!(check_references(&state, &req).is_err());
    }
}
