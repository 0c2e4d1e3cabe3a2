//! # Employee API
//!
//! CRUD for the employee register. Writes require a catalog-management
//! role (admin or qa-officer); reads are open to every authenticated
//! caller.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use trt_core::{Department, EmployeeId, Role};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, require_non_empty, Validate};
use crate::routes::ApiResponse;
use crate::state::{AppState, EmployeeRecord};

/// Request to register or replace an employee.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeRequest {
    pub name: String,
    #[schema(value_type = String)]
    pub department: Department,
    #[schema(value_type = String)]
    pub role: Role,
}

impl Validate for EmployeeRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_non_empty(&self.name, "name")?;
        if self.name.len() > 255 {
            return Err(AppError::Validation(
                "name must not exceed 255 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional department filter for listings. `All` disables the filter.
#[derive(Debug, Default, Deserialize)]
pub struct DepartmentFilter {
    pub department: Option<String>,
}

impl DepartmentFilter {
    /// Resolve the filter to a concrete department, if one applies.
    pub fn resolve(&self) -> Result<Option<Department>, AppError> {
        match self.department.as_deref() {
            None => Ok(None),
            Some("All") => Ok(None),
            Some(name) => Ok(Some(Department::parse(name)?)),
        }
    }
}

/// Build the employees router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/employees", get(list_employees).post(create_employee))
        .route(
            "/v1/employees/:id",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
}

/// GET /v1/employees — List employees, optionally filtered by department.
#[utoipa::path(
    get,
    path = "/v1/employees",
    params(("department" = Option<String>, Query, description = "Department filter, 'All' for no filter")),
    responses(
        (status = 200, description = "Employee list", body = Vec<EmployeeRecord>),
        (status = 422, description = "Unknown department", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "employees"
)]
async fn list_employees(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(filter): Query<DepartmentFilter>,
) -> Result<Json<ApiResponse<Vec<EmployeeRecord>>>, AppError> {
    let department = filter.resolve()?;
    let mut employees: Vec<EmployeeRecord> = state
        .employees
        .list()
        .into_iter()
        .filter(|e| department.map_or(true, |d| e.department == d))
        .collect();
    employees.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    Ok(Json(ApiResponse::new(employees)))
}

/// POST /v1/employees — Register an employee.
#[utoipa::path(
    post,
    path = "/v1/employees",
    request_body = EmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeRecord),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "employees"
)]
async fn create_employee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<EmployeeRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<EmployeeRecord>>), AppError> {
    caller.require(Role::can_manage_catalog, "register employees")?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let record = EmployeeRecord {
        id: EmployeeId::new(),
        name: req.name,
        department: req.department,
        role: req.role,
        created_at: now,
        updated_at: now,
    };

    state.employees.insert(record.id, record.clone());
    persist(&state, &record).await?;

    tracing::info!(employee_id = %record.id, department = %record.department, "employee registered");
    Ok((axum::http::StatusCode::CREATED, Json(ApiResponse::new(record))))
}

/// GET /v1/employees/:id — Fetch one employee.
#[utoipa::path(
    get,
    path = "/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "employees"
)]
async fn get_employee(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EmployeeRecord>>, AppError> {
    let record = state
        .employees
        .get(&id.into())
        .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))?;

    Ok(Json(ApiResponse::new(record)))
}

/// PUT /v1/employees/:id — Replace an employee record.
#[utoipa::path(
    put,
    path = "/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = EmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "employees"
)]
async fn update_employee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<EmployeeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EmployeeRecord>>, AppError> {
    caller.require(Role::can_manage_catalog, "update employees")?;
    let req = extract_validated_json(body)?;

    let id = EmployeeId::from(id);
    let existing = state
        .employees
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))?;

    let record = EmployeeRecord {
        id,
        name: req.name,
        department: req.department,
        role: req.role,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.employees.insert(id, record.clone());
    persist(&state, &record).await?;

    Ok(Json(ApiResponse::new(record)))
}

/// DELETE /v1/employees/:id — Remove an employee.
///
/// Historical attendance referencing the employee is left in place; the
/// evaluator treats dangling references as absent.
#[utoipa::path(
    delete,
    path = "/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee removed", body = EmployeeRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "employees"
)]
async fn delete_employee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EmployeeRecord>>, AppError> {
    caller.require(Role::can_manage_catalog, "delete employees")?;

    let id = EmployeeId::from(id);
    let record = state
        .employees
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::employees::delete(pool, *id.as_uuid()).await {
            tracing::error!(employee_id = %id, error = %e, "failed to delete employee from database");
            return Err(AppError::Internal(
                "employee removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    Ok(Json(ApiResponse::new(record)))
}

/// Write-through persistence. Failure is surfaced to the client because
/// the in-memory record would be lost on restart, causing silent data loss.
async fn persist(state: &AppState, record: &EmployeeRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::employees::upsert(pool, record).await {
            tracing::error!(employee_id = %record.id, error = %e, "failed to persist employee to database");
            return Err(AppError::Internal(
                "employee recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
