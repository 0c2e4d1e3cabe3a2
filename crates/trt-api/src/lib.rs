//! # trt-api — Axum API for the Training Record Tracker
//!
//! HTTP surface over the pure evaluator in trt-compliance. The four
//! collections live in in-memory stores (optionally write-through to
//! Postgres); evaluation endpoints snapshot the stores and hand the
//! snapshot to the evaluator.
//!
//! ## API Surface
//!
//! | Prefix                  | Module                   | Domain              |
//! |-------------------------|--------------------------|---------------------|
//! | `/v1/employees/*`       | [`routes::employees`]    | Employee register   |
//! | `/v1/topics/*`          | [`routes::topics`]       | Topic catalog       |
//! | `/v1/schedules/*`       | [`routes::schedules`]    | Training sessions   |
//! | `/v1/attendances/*`     | [`routes::attendances`]  | Attendance records  |
//! | `/v1/compliance/*`      | [`routes::compliance`]   | Evaluation queries  |
//! | `/v1/dashboard`         | [`routes::compliance`]   | Aggregate counts    |
//! | `/v1/reports/*`         | [`routes::reports`]      | CSV exports         |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! OpenAPI spec via utoipa derive macros at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::{Extension, Router};
use chrono::Utc;
use tower_http::trace::TraceLayer;

use trt_compliance::pending_topics;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Check if metrics are enabled via the `TRT_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("TRT_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`), `/metrics` and `/openapi.json` are mounted
/// outside the auth middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = metrics_enabled();

    // Authenticated API routes.
    //
    // Body size limit: 1 MiB. Request bodies here are small JSON documents;
    // the largest legitimate payload is a schedule with a full invite list.
    let api = Router::new()
        .merge(routes::employees::router())
        .merge(routes::topics::router())
        .merge(routes::schedules::router())
        .merge(routes::attendances::router())
        .merge(routes::compliance::router())
        .merge(routes::reports::router());

    let mut api = api
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Unauthenticated surface: health probes plus the API description.
    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(openapi::router());

    // Mount /metrics when metrics are enabled (unauthenticated, like health probes).
    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull
/// model), then gathers and encodes all metrics in Prometheus text
/// exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics.employees_total().set(state.employees.len() as f64);
    metrics.topics_total().set(state.topics.len() as f64);
    metrics.schedules_total().set(state.schedules.len() as f64);
    metrics
        .attendances_total()
        .set(state.attendances.len() as f64);

    let snapshot = state.snapshot();
    let pending = pending_topics(&snapshot, Utc::now(), state.config.lookback);
    metrics.pending_employees_total().set(pending.len() as f64);

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve traffic.
///
/// Checks:
/// - In-memory stores are accessible (read locks acquirable).
/// - Database connection is healthy (when configured).
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, error::AppError> {
    let _ = state.employees.len();
    let _ = state.topics.len();
    let _ = state.schedules.len();
    let _ = state.attendances.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return Err(error::AppError::ServiceUnavailable(
                "database unreachable".to_string(),
            ));
        }
    }

    Ok("ready")
}
