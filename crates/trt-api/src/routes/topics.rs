//! # Training Topic API
//!
//! CRUD for the topic catalog. A topic belongs to one owning department;
//! topics owned by a universal department apply to every employee.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use trt_core::{Department, Role, TopicId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_non_empty, Validate};
use crate::routes::employees::DepartmentFilter;
use crate::routes::ApiResponse;
use crate::state::{AppState, TopicRecord};

/// Request to create or replace a topic.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicRequest {
    pub title: String,
    #[schema(value_type = String)]
    pub department: Department,
}

impl Validate for TopicRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_non_empty(&self.title, "title")?;
        if self.title.len() > 255 {
            return Err(AppError::Validation(
                "title must not exceed 255 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the topics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/topics", get(list_topics).post(create_topic))
        .route(
            "/v1/topics/:id",
            get(get_topic).put(update_topic).delete(delete_topic),
        )
}

/// GET /v1/topics — List topics, optionally filtered by owning department.
#[utoipa::path(
    get,
    path = "/v1/topics",
    params(("department" = Option<String>, Query, description = "Department filter, 'All' for no filter")),
    responses(
        (status = 200, description = "Topic list", body = Vec<TopicRecord>),
    ),
    security(("bearer" = [])),
    tag = "topics"
)]
async fn list_topics(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(filter): Query<DepartmentFilter>,
) -> Result<Json<ApiResponse<Vec<TopicRecord>>>, AppError> {
    let department = filter.resolve()?;
    let mut topics: Vec<TopicRecord> = state
        .topics
        .list()
        .into_iter()
        .filter(|t| department.map_or(true, |d| t.department == d))
        .collect();
    topics.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));

    Ok(Json(ApiResponse::new(topics)))
}

/// POST /v1/topics — Create a topic.
#[utoipa::path(
    post,
    path = "/v1/topics",
    request_body = TopicRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicRecord),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "topics"
)]
async fn create_topic(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<TopicRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<TopicRecord>>), AppError> {
    caller.require(Role::can_manage_catalog, "create topics")?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let record = TopicRecord {
        id: TopicId::new(),
        title: req.title,
        department: req.department,
        created_at: now,
        updated_at: now,
    };

    state.topics.insert(record.id, record.clone());
    persist(&state, &record).await?;

    tracing::info!(topic_id = %record.id, department = %record.department, "topic created");
    Ok((axum::http::StatusCode::CREATED, Json(ApiResponse::new(record))))
}

/// GET /v1/topics/:id — Fetch one topic.
#[utoipa::path(
    get,
    path = "/v1/topics/{id}",
    params(("id" = Uuid, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic found", body = TopicRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "topics"
)]
async fn get_topic(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TopicRecord>>, AppError> {
    let record = state
        .topics
        .get(&id.into())
        .ok_or_else(|| AppError::NotFound(format!("topic {id} not found")))?;

    Ok(Json(ApiResponse::new(record)))
}

/// PUT /v1/topics/:id — Replace a topic.
#[utoipa::path(
    put,
    path = "/v1/topics/{id}",
    params(("id" = Uuid, Path, description = "Topic ID")),
    request_body = TopicRequest,
    responses(
        (status = 200, description = "Topic updated", body = TopicRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "topics"
)]
async fn update_topic(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<TopicRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TopicRecord>>, AppError> {
    caller.require(Role::can_manage_catalog, "update topics")?;
    let req = extract_validated_json(body)?;

    let id = TopicId::from(id);
    let existing = state
        .topics
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("topic {id} not found")))?;

    let record = TopicRecord {
        id,
        title: req.title,
        department: req.department,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.topics.insert(id, record.clone());
    persist(&state, &record).await?;

    Ok(Json(ApiResponse::new(record)))
}

/// DELETE /v1/topics/:id — Remove a topic.
///
/// Schedules that reference the topic keep the id; the evaluator skips
/// references it cannot resolve.
#[utoipa::path(
    delete,
    path = "/v1/topics/{id}",
    params(("id" = Uuid, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic removed", body = TopicRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "topics"
)]
async fn delete_topic(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TopicRecord>>, AppError> {
    caller.require(Role::can_manage_catalog, "delete topics")?;

    let id = TopicId::from(id);
    let record = state
        .topics
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("topic {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::topics::delete(pool, *id.as_uuid()).await {
            tracing::error!(topic_id = %id, error = %e, "failed to delete topic from database");
            return Err(AppError::Internal(
                "topic removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    Ok(Json(ApiResponse::new(record)))
}

async fn persist(state: &AppState, record: &TopicRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::topics::upsert(pool, record).await {
            tracing::error!(topic_id = %record.id, error = %e, "failed to persist topic to database");
            return Err(AppError::Internal(
                "topic recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
