//! Shared helpers for the HTTP-level integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use campus_api::adapters::{DemoAuthProvider, InMemorySnapshotStore};
use campus_api::config::Config;
use campus_api::service::StoreService;
use campus_api::web::{self, AppState};
use campus_core::directory::CampusDirectory;
use campus_core::providers::{ManualClock, SequentialIdGenerator};

/// Monday 2024-03-04, 09:30 on the campus clock (UTC+05:30).
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap()
}

/// Build a test `Config` with safe defaults: in-memory storage and a fixed
/// campus offset so availability checks do not depend on the host time zone.
pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "STORAGE_BACKEND" => Some("memory".to_string()),
        "CAMPUS_UTC_OFFSET_MINUTES" => Some("330".to_string()),
        _ => None,
    })
    .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub repo: Arc<InMemorySnapshotStore>,
    pub clock: Arc<ManualClock>,
}

/// Build the full application router over an in-memory repository, a manual
/// clock and sequential ids.
pub async fn build_test_app() -> TestApp {
    let repo = Arc::new(InMemorySnapshotStore::new());
    let clock = Arc::new(ManualClock::new(monday_morning()));
    let (service, _writer) = StoreService::start(
        repo.clone(),
        clock.clone(),
        Arc::new(SequentialIdGenerator::default()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let state = Arc::new(AppState {
        service: Arc::new(service),
        directory: Arc::new(CampusDirectory::seeded()),
        auth: Arc::new(DemoAuthProvider),
        clock: clock.clone(),
        config: Arc::new(test_config()),
    });

    TestApp {
        router: web::router(state.clone()),
        state,
        repo,
        clock,
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str) -> Response {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
