//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer-token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer token authentication. Tokens are configured via TRT_AUTH_TOKENS.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TRT API — Training Record Tracker",
        version = "0.3.2",
        description = "Employee training tracking service.\n\nProvides:\n- **Employee, topic, schedule, and attendance** management\n- **Compliance evaluation**: pending topics per employee and refresher classification over a rolling lookback window\n- **CSV report exports**: refresher status, pending topics, date-range attendance, monthly summary\n- **Dashboard** aggregate counts\n\nAuthentication: Bearer token via `Authorization: Bearer <token>` header.\nAll `/v1/*` endpoints require authentication when tokens are configured. Health probes (`/health/*`) and `/metrics` are unauthenticated.",
        license(name = "Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer" = [])
    ),
    paths(
        // ── Employees ───────────────────────────────────────────────────
        crate::routes::employees::list_employees,
        crate::routes::employees::create_employee,
        crate::routes::employees::get_employee,
        crate::routes::employees::update_employee,
        crate::routes::employees::delete_employee,
        // ── Topics ──────────────────────────────────────────────────────
        crate::routes::topics::list_topics,
        crate::routes::topics::create_topic,
        crate::routes::topics::get_topic,
        crate::routes::topics::update_topic,
        crate::routes::topics::delete_topic,
        // ── Schedules ───────────────────────────────────────────────────
        crate::routes::schedules::list_schedules,
        crate::routes::schedules::create_schedule,
        crate::routes::schedules::get_schedule,
        crate::routes::schedules::update_schedule,
        crate::routes::schedules::delete_schedule,
        // ── Attendances ─────────────────────────────────────────────────
        crate::routes::attendances::list_attendances,
        crate::routes::attendances::mark_attendance,
        crate::routes::attendances::get_attendance,
        crate::routes::attendances::update_attendance,
        crate::routes::attendances::delete_attendance,
        // ── Compliance ──────────────────────────────────────────────────
        crate::routes::compliance::pending,
        crate::routes::compliance::refresher,
        crate::routes::compliance::dashboard,
        // ── Reports ─────────────────────────────────────────────────────
        crate::routes::reports::refresher_export,
        crate::routes::reports::pending_export,
        crate::routes::reports::attendance_export,
        crate::routes::reports::employee_export,
        crate::routes::reports::monthly_export,
    ),
    components(
        schemas(
            // ── State record types ──────────────────────────────────────
            crate::state::EmployeeRecord,
            crate::state::TopicRecord,
            crate::state::ScheduleRecord,
            crate::state::AttendanceRecord,
            // ── Error types ─────────────────────────────────────────────
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            // ── Request/response DTOs ───────────────────────────────────
            crate::routes::employees::EmployeeRequest,
            crate::routes::topics::TopicRequest,
            crate::routes::schedules::ScheduleRequest,
            crate::routes::attendances::AttendanceRequest,
            crate::routes::attendances::AttendanceUpdateRequest,
            crate::routes::compliance::PendingResponse,
            crate::routes::compliance::RefresherResponse,
            crate::routes::compliance::DashboardResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "employees", description = "Employee register — names, departments, roles"),
        (name = "topics", description = "Training topic catalog, owned per department"),
        (name = "schedules", description = "Training sessions — date, topics covered, invited employees, trainer"),
        (name = "attendances", description = "Attendance records, one per (schedule, employee) pair"),
        (name = "compliance", description = "Pending and refresher evaluation over a rolling lookback window"),
        (name = "reports", description = "CSV exports — refresher, pending, attendance, monthly summary"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router. Serves the spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
