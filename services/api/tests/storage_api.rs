//! HTTP-level tests for preferences, notifications, search history and the
//! durable-write status endpoints.

mod common;

use axum::http::StatusCode;
use campus_api::persistence::WriteStatus;
use common::{body_json, build_test_app, delete, get, post, post_json, put_json};
use serde_json::json;

#[tokio::test]
async fn language_preference_is_validated() {
    let app = build_test_app().await;

    let response = put_json(&app.router, "/preferences/language", json!({"language": "fr"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json(&app.router, "/preferences/language", json!({"language": "hi"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"language": "hi", "darkMode": false}));
}

#[tokio::test]
async fn search_history_is_deduplicated_and_promoted() {
    let app = build_test_app().await;
    for query in ["lib", "cafeteria", "lib", "   "] {
        post_json(&app.router, "/searches", json!({"query": query})).await;
    }
    let searches = body_json(get(&app.router, "/searches").await).await;
    assert_eq!(searches, json!(["lib", "cafeteria"]));

    assert_eq!(delete(&app.router, "/searches").await.status(), StatusCode::NO_CONTENT);
    assert_eq!(body_json(get(&app.router, "/searches").await).await, json!([]));
}

#[tokio::test]
async fn notifications_flow() {
    let app = build_test_app().await;
    for title in ["Class moved", "Library hours"] {
        let response = post_json(
            &app.router,
            "/notifications",
            json!({"title": title, "message": "See details", "type": "alert", "locationId": "3"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = body_json(get(&app.router, "/notifications").await).await;
    assert_eq!(body["unreadCount"], 2);
    assert_eq!(body["notifications"][0]["title"], "Library hours");
    let id = body["notifications"][0]["id"].as_str().unwrap().to_string();

    let response = post(&app.router, &format!("/notifications/{id}/read")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = post(&app.router, "/notifications/nope/read").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = body_json(get(&app.router, "/notifications").await).await;
    assert_eq!(body["unreadCount"], 1);

    let marked = body_json(post(&app.router, "/notifications/read-all").await).await;
    assert_eq!(marked["marked"], 1);

    assert_eq!(delete(&app.router, "/notifications").await.status(), StatusCode::NO_CONTENT);
    let body = body_json(get(&app.router, "/notifications").await).await;
    assert_eq!(body["unreadCount"], 0);
}

#[tokio::test]
async fn changes_reach_the_repository() {
    let app = build_test_app().await;
    post_json(&app.router, "/bookmarks", json!({"locationId": "5"})).await;

    let revision = app.state.service.read(|s| s.revision()).await;
    app.state.service.writer().wait_for_revision(revision).await;

    let saved = app.repo.saved().await.unwrap();
    assert_eq!(saved.bookmarks.len(), 1);
    assert_eq!(saved.bookmarks[0].location_id, "5");

    let status = body_json(get(&app.router, "/storage/status").await).await;
    assert_eq!(status["state"], "saved");
    assert_eq!(status["revision"], revision);
}

#[tokio::test]
async fn failed_write_is_reported_and_retried() {
    let app = build_test_app().await;
    app.repo.fail_writes(true);

    post(&app.router, "/preferences/dark-mode/toggle").await;
    app.state.service.writer().wait_for_revision(1).await;

    let status = body_json(get(&app.router, "/storage/status").await).await;
    assert_eq!(status["state"], "failed");
    assert_eq!(status["revision"], 1);

    // The live state is unaffected by the failed write.
    let preferences = body_json(get(&app.router, "/preferences").await).await;
    assert_eq!(preferences["darkMode"], true);

    app.repo.fail_writes(false);
    let mut watch = app.state.service.writer().watch_status();
    let retry = body_json(post(&app.router, "/storage/retry").await).await;
    assert_eq!(retry["retried"], true);
    watch
        .wait_for(|s| matches!(s, WriteStatus::Saved { .. }))
        .await
        .unwrap();
    assert!(app.repo.saved().await.unwrap().dark_mode);

    let retry = body_json(post(&app.router, "/storage/retry").await).await;
    assert_eq!(retry["retried"], false);
}
