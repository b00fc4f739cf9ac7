//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the real application router (same middleware stack as `main.rs`)
//! over a `#[sqlx::test]`-provided pool, plus request/response helpers and
//! clinic seeding fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use dentora_api::auth::jwt::{generate_token, JwtConfig};
use dentora_api::config::ServerConfig;
use dentora_api::router::build_app_router;
use dentora_api::state::AppState;
use dentora_db::repositories::DentistPatientRepo;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        horizon_months: 3,
        horizon_refresh_enabled: false,
        horizon_refresh_interval_secs: 21600,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This goes through the same [`build_app_router`] as production, so tests
/// exercise the identical middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery).
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Issue a valid access token for the given dentist/tenant pair.
pub fn auth_token(dentist_id: i64, tenant_id: i64) -> String {
    generate_token(dentist_id, tenant_id, "dentist", &test_config().jwt)
        .expect("token generation should not fail")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send an unauthenticated GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a Bearer token.
pub async fn authed_get(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated POST request with a JSON body.
pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated PUT request with a JSON body.
pub async fn put_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated DELETE request.
pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect and deserialize a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}

/// Assert a response's status and return its JSON body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A seeded tenant with one dentist and one linked patient.
pub struct Clinic {
    pub tenant_id: i64,
    pub dentist_id: i64,
    pub patient_id: i64,
}

/// Seed a tenant, a dentist, a patient, and the treatment relationship
/// between them.
pub async fn seed_clinic(pool: &PgPool) -> Clinic {
    let (tenant_id,): (i64,) =
        sqlx::query_as("INSERT INTO tenants (name) VALUES ('Smile Dental') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let (dentist_id,): (i64,) = sqlx::query_as(
        "INSERT INTO dentists (tenant_id, display_name) VALUES ($1, 'Dr. Ada') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let (patient_id,): (i64,) = sqlx::query_as(
        "INSERT INTO patients (tenant_id, display_name) VALUES ($1, 'Pat Doe') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    DentistPatientRepo::link(pool, patient_id, dentist_id, tenant_id)
        .await
        .unwrap();
    Clinic {
        tenant_id,
        dentist_id,
        patient_id,
    }
}

/// Seed a second dentist in the same tenant.
pub async fn seed_other_dentist(pool: &PgPool, tenant_id: i64) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO dentists (tenant_id, display_name) VALUES ($1, 'Dr. Bob') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

/// Seed a patient in the given tenant with no dentist relationship.
pub async fn seed_unlinked_patient(pool: &PgPool, tenant_id: i64) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO patients (tenant_id, display_name) VALUES ($1, 'Stranger') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

/// A weekly creation payload anchored on tomorrow, so the first occurrence
/// is always inside the generation horizon and strictly in the future.
pub fn weekly_payload(patient_id: i64) -> serde_json::Value {
    use chrono::Datelike;

    let start = chrono::Utc::now().date_naive() + chrono::Duration::days(1);
    let weekday = start.weekday().num_days_from_sunday();
    serde_json::json!({
        "patient_id": patient_id,
        "frequency": "WEEKLY",
        "interval": 1,
        "days_of_week": [weekday],
        "time_of_day": "10:00",
        "duration_minutes": 30,
        "start_date": start.format("%Y-%m-%d").to_string(),
        "procedure_type": "cleaning"
    })
}
