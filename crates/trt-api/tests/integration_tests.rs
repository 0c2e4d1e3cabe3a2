//! End-to-end tests running requests through the full router, middleware
//! included, via `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use trt_api::auth::AuthConfig;
use trt_api::state::{AppConfig, AppState};
use trt_core::Role;

fn open_app() -> Router {
    trt_api::app(AppState::new())
}

fn authed_app() -> Router {
    let auth = AuthConfig::disabled()
        .with_token("admin-token", Role::Admin, "ops")
        .with_token("viewer-token", Role::User, "viewer");
    let config = AppConfig {
        auth,
        ..AppConfig::default()
    };
    trt_api::app(AppState::with_config(config, None))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_employee(app: &Router, name: &str, department: &str) -> Value {
    let (status, body) = send(
        app,
        post(
            "/v1/employees",
            json!({"name": name, "department": department, "role": "user"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create employee: {body}");
    body["data"].clone()
}

async fn create_topic(app: &Router, title: &str, department: &str) -> Value {
    let (status, body) = send(
        app,
        post("/v1/topics", json!({"title": title, "department": department})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create topic: {body}");
    body["data"].clone()
}

// ── Health and observability ─────────────────────────────────────────

#[tokio::test]
async fn liveness_is_unauthenticated() {
    let app = authed_app();
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_without_database_is_ready() {
    let (status, _) = send(&open_app(), get("/health/readiness")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn metrics_endpoint_exposes_domain_gauges() {
    let app = open_app();
    create_employee(&app, "Amira Khan", "Production").await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("trt_employees_total 1"), "got: {text}");
    assert!(text.contains("trt_http_requests_total"));
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let (status, body) = send(&open_app(), get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/employees"].is_object());

    // Served without credentials even when tokens are configured.
    let (status, _) = send(&authed_app(), get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
}

// ── Authentication and authorization ─────────────────────────────────

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (status, body) = send(&authed_app(), get("/v1/employees")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let request = Request::builder()
        .uri("/v1/employees")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&authed_app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn viewer_can_read_but_not_write() {
    let app = authed_app();

    let read = Request::builder()
        .uri("/v1/topics")
        .header(header::AUTHORIZATION, "Bearer viewer-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, read).await;
    assert_eq!(status, StatusCode::OK);

    let write = Request::builder()
        .method("POST")
        .uri("/v1/topics")
        .header(header::AUTHORIZATION, "Bearer viewer-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"title": "Fire Safety", "department": "HSE"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, write).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));
}

#[tokio::test]
async fn admin_token_can_write() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/topics")
        .header(header::AUTHORIZATION, "Bearer admin-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"title": "Fire Safety", "department": "HSE"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&authed_app(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
}

// ── Employee CRUD ────────────────────────────────────────────────────

#[tokio::test]
async fn employee_crud_roundtrip() {
    let app = open_app();
    let created = create_employee(&app, "Amira Khan", "Quality Control").await;
    let id = created["id"].as_str().unwrap().to_owned();

    let (status, body) = send(&app, get(&format!("/v1/employees/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!("Amira Khan"));
    assert_eq!(body["data"]["department"], json!("Quality Control"));

    let update = Request::builder()
        .method("PUT")
        .uri(format!("/v1/employees/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"name": "Amira Khan", "department": "HR", "role": "department-head"})
                .to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["department"], json!("HR"));

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/employees/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get(&format!("/v1/employees/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn unknown_department_is_validation_error() {
    let (status, body) = send(
        &open_app(),
        post(
            "/v1/employees",
            json!({"name": "X", "department": "Shipping", "role": "user"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn blank_name_is_validation_error() {
    let (status, body) = send(
        &open_app(),
        post(
            "/v1/employees",
            json!({"name": "  ", "department": "HR", "role": "user"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn employee_list_filters_by_department() {
    let app = open_app();
    create_employee(&app, "A", "Production").await;
    create_employee(&app, "B", "Marketing").await;

    let (status, body) = send(&app, get("/v1/employees?department=Production")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, get("/v1/employees?department=All")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

// ── Schedules and attendance ─────────────────────────────────────────

#[tokio::test]
async fn schedule_with_unknown_references_is_rejected() {
    let (status, body) = send(
        &open_app(),
        post(
            "/v1/schedules",
            json!({
                "date": Utc::now(),
                "topic_ids": [uuid::Uuid::new_v4()],
                "employee_ids": [uuid::Uuid::new_v4()],
                "trainer_name": "R. Varga"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn attendance_rules_are_enforced() {
    let app = open_app();
    let invited = create_employee(&app, "Invited", "Production").await;
    let outsider = create_employee(&app, "Outsider", "Production").await;
    let topic = create_topic(&app, "Machine Safety", "Production").await;

    let (status, body) = send(
        &app,
        post(
            "/v1/schedules",
            json!({
                "date": Utc::now() - Duration::days(5),
                "topic_ids": [topic["id"]],
                "employee_ids": [invited["id"]],
                "trainer_name": "R. Varga"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let schedule_id = body["data"]["id"].clone();

    // Not invited: validation error.
    let (status, _) = send(
        &app,
        post(
            "/v1/attendances",
            json!({
                "schedule_id": schedule_id,
                "employee_id": outsider["id"],
                "attended": true,
                "rating": 4
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Invited: recorded.
    let (status, _) = send(
        &app,
        post(
            "/v1/attendances",
            json!({
                "schedule_id": schedule_id,
                "employee_id": invited["id"],
                "attended": true,
                "rating": 4
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same pair twice: conflict.
    let (status, body) = send(
        &app,
        post(
            "/v1/attendances",
            json!({
                "schedule_id": schedule_id,
                "employee_id": invited["id"],
                "attended": false,
                "rating": 1
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("CONFLICT"));
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let (status, _) = send(
        &open_app(),
        post(
            "/v1/attendances",
            json!({
                "schedule_id": uuid::Uuid::new_v4(),
                "employee_id": uuid::Uuid::new_v4(),
                "attended": true,
                "rating": 6
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Compliance evaluation ────────────────────────────────────────────

#[tokio::test]
async fn pending_clears_after_recent_attended_training() {
    let app = open_app();
    let employee = create_employee(&app, "Amira Khan", "Production").await;
    let topic = create_topic(&app, "Machine Safety", "Production").await;

    // Untrained: the topic is pending.
    let (status, body) = send(&app, get("/v1/compliance/pending")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0]["pending_topics"][0]["title"],
        json!("Machine Safety")
    );

    // Attend a session inside the window.
    let (_, body) = send(
        &app,
        post(
            "/v1/schedules",
            json!({
                "date": Utc::now() - Duration::days(10),
                "topic_ids": [topic["id"]],
                "employee_ids": [employee["id"]],
                "trainer_name": "R. Varga"
            }),
        ),
    )
    .await;
    let schedule_id = body["data"]["id"].clone();
    let (status, _) = send(
        &app,
        post(
            "/v1/attendances",
            json!({
                "schedule_id": schedule_id,
                "employee_id": employee["id"],
                "attended": true,
                "rating": 5
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get("/v1/compliance/pending")).await;
    assert!(body["data"]["entries"].as_array().unwrap().is_empty());

    // A 5-day override window puts it back to pending.
    let (_, body) = send(&app, get("/v1/compliance/pending?lookback_days=5")).await;
    assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pending_for_unknown_employee_is_not_found() {
    let uri = format!("/v1/compliance/pending?employee_id={}", uuid::Uuid::new_v4());
    let (status, _) = send(&open_app(), get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresher_reports_untrained_topic() {
    let app = open_app();
    create_employee(&app, "Amira Khan", "HSE").await;
    create_topic(&app, "Fire Safety", "HSE").await;

    let (status, body) = send(&app, get("/v1/compliance/refresher")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0]["status"]["kind"],
        json!("initial_training_required")
    );
    assert_eq!(entries[0]["priority"], json!("High"));
}

#[tokio::test]
async fn dashboard_counts_pending_employees() {
    let app = open_app();
    create_employee(&app, "Amira Khan", "Production").await;
    create_topic(&app, "Machine Safety", "Production").await;

    let (status, body) = send(&app, get("/v1/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["employees"], json!(1));
    assert_eq!(body["data"]["topics"], json!(1));
    assert_eq!(body["data"]["attended"], json!(0));
    assert_eq!(body["data"]["average_rating"], json!(null));
    assert_eq!(body["data"]["pending_employees"], json!(1));
}

// ── CSV reports ──────────────────────────────────────────────────────

#[tokio::test]
async fn pending_report_downloads_as_csv() {
    let app = open_app();
    create_employee(&app, "Amira Khan", "Production").await;
    create_topic(&app, "Machine Safety", "Production").await;

    let response = app
        .clone()
        .oneshot(get("/v1/reports/pending.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(content_type.starts_with("text/csv"));
    assert!(response
        .headers()
        .contains_key(header::CONTENT_DISPOSITION));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("\"Employee\",\"Department\",\"Topic\""));
    assert!(text.contains("\"Amira Khan\""));
}

#[tokio::test]
async fn attendance_report_requires_valid_range() {
    let (status, body) = send(
        &open_app(),
        get("/v1/reports/attendance.csv?from=2026-02-01&to=2026-01-01"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn employee_report_lists_history_and_pending() {
    let app = open_app();
    let employee = create_employee(&app, "Amira Khan", "Production").await;
    create_topic(&app, "Machine Safety", "Production").await;

    let uri = format!(
        "/v1/reports/employee.csv?employee_id={}",
        employee["id"].as_str().unwrap()
    );
    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with(
        "\"Employee Name\",\"Department\",\"Training Topic\",\"Date Completed\",\"Rating\",\"Pending Topics\""
    ));
    // Nothing attended yet: one placeholder row with the topic pending.
    assert!(text.contains("\"No trainings completed\""));
    assert!(text.contains("\"Machine Safety (Production)\""));

    let (status, _) = send(
        &app,
        get(&format!(
            "/v1/reports/employee.csv?employee_id={}",
            uuid::Uuid::new_v4()
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn monthly_report_downloads() {
    let response = open_app()
        .oneshot(get("/v1/reports/monthly.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
