//! HTTP-level tests for the timetable and room availability endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, get, patch_json, post_json};
use serde_json::{json, Value};

fn class(room: &str, day: u8, start: &str, end: &str) -> Value {
    json!({
        "name": "Calculus II",
        "room": room,
        "building": "Academic Block A",
        "startTime": start,
        "endTime": end,
        "dayOfWeek": day
    })
}

#[tokio::test]
async fn overlapping_class_is_rejected_with_conflict() {
    let app = build_test_app().await;

    let response = post_json(&app.router, "/schedule", class("A101", 1, "09:00", "10:30")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;

    let response = post_json(&app.router, "/schedule", class("A101", 1, "10:00", "11:00")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = body_json(response).await;
    assert_eq!(error["code"], "SLOT_CONFLICT");
    assert!(error["error"].as_str().unwrap().contains(first["id"].as_str().unwrap()));

    // Back-to-back is fine.
    let response = post_json(&app.router, "/schedule", class("A101", 1, "10:30", "11:30")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let all = body_json(get(&app.router, "/schedule").await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let app = build_test_app().await;

    let response = post_json(&app.router, "/schedule", class("A101", 1, "9:00", "10:00")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let response = post_json(&app.router, "/schedule", class("A101", 7, "09:00", "10:00")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(&app.router, "/schedule", class("A101", 1, "11:00", "10:00")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_SLOT");

    let response = get(&app.router, "/schedule?day=9").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn day_listing_is_sorted_by_start_time() {
    let app = build_test_app().await;
    for (room, start, end) in [("A102", "14:15", "15:15"), ("A101", "09:15", "10:15"), ("S304", "11:15", "12:15")] {
        post_json(&app.router, "/schedule", class(room, 3, start, end)).await;
    }
    post_json(&app.router, "/schedule", class("A101", 4, "08:00", "09:00")).await;

    let wednesday = body_json(get(&app.router, "/schedule?day=3").await).await;
    let starts: Vec<&str> = wednesday
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["startTime"].as_str().unwrap())
        .collect();
    assert_eq!(starts, ["09:15", "11:15", "14:15"]);
}

#[tokio::test]
async fn week_view_has_seven_days_with_colored_cards() {
    let app = build_test_app().await;
    post_json(&app.router, "/schedule", class("A101", 1, "09:15", "10:15")).await;

    let week = body_json(get(&app.router, "/schedule/week").await).await;
    let days = week.as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["name"], "Sunday");
    assert_eq!(days[1]["dayOfWeek"], 1);

    let card = &days[1]["classes"][0];
    assert_eq!(card["name"], "Calculus II");
    assert!(card["color"].as_str().unwrap().starts_with('#'));
    assert_eq!(card["period"], 1);

    let periods = body_json(get(&app.router, "/schedule/periods").await).await;
    assert_eq!(periods.as_array().unwrap().len(), 8);
    assert_eq!(periods[3]["isBreak"], true);
}

#[tokio::test]
async fn update_into_conflict_keeps_the_original() {
    let app = build_test_app().await;
    post_json(&app.router, "/schedule", class("A101", 1, "09:00", "10:30")).await;
    let second = body_json(post_json(&app.router, "/schedule", class("A101", 1, "11:00", "12:00")).await).await;
    let id = second["id"].as_str().unwrap();

    let response = patch_json(&app.router, &format!("/schedule/{id}"), json!({"startTime": "09:00"})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let all = body_json(get(&app.router, "/schedule").await).await;
    assert_eq!(all[1], second);

    let response = patch_json(&app.router, &format!("/schedule/{id}"), json!({"room": "A102", "startTime": "09:00"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let moved = body_json(response).await;
    assert_eq!(moved["room"], "A102");
    assert_eq!(moved["endTime"], "12:00");

    let response = patch_json(&app.router, "/schedule/missing", json!({"room": "A103"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_and_clear() {
    let app = build_test_app().await;
    let entry = body_json(post_json(&app.router, "/schedule", class("A101", 2, "09:00", "10:00")).await).await;
    post_json(&app.router, "/schedule", class("A102", 2, "09:00", "10:00")).await;

    let uri = format!("/schedule/{}", entry["id"].as_str().unwrap());
    assert_eq!(delete(&app.router, &uri).await.status(), StatusCode::NO_CONTENT);

    // Deleting again is a no-op and leaves the other class alone.
    let revision = app.state.service.read(|s| s.revision()).await;
    assert_eq!(delete(&app.router, &uri).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.state.service.read(|s| s.revision()).await, revision);
    let all = body_json(get(&app.router, "/schedule").await).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    assert_eq!(delete(&app.router, "/schedule").await.status(), StatusCode::NO_CONTENT);
    let all = body_json(get(&app.router, "/schedule").await).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn room_availability_at_explicit_and_current_time() {
    let app = build_test_app().await;
    post_json(&app.router, "/schedule", class("A101", 1, "09:00", "10:30")).await;

    let base = "/rooms/availability?room=A101&building=Academic%20Block%20A";

    let busy = body_json(get(&app.router, &format!("{base}&day=1&time=09:30")).await).await;
    assert_eq!(busy["available"], false);
    assert_eq!(busy["busyUntil"], "10:30");

    let free = body_json(get(&app.router, &format!("{base}&day=1&time=11:00")).await).await;
    assert_eq!(free, json!({"available": true}));

    // Without day/time the campus clock is used: Monday 09:30.
    let now = body_json(get(&app.router, base).await).await;
    assert_eq!(now["available"], false);

    let response = get(&app.router, &format!("{base}&day=1&time=25:00")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
